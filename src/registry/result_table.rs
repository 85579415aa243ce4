//! The per-feature, per-month table of computed averages.

use crate::registry::error::RegistryError;
use crate::types::month::Month;
use polars::prelude::{Column, CsvWriter, DataFrame, SerWriter};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// Column name of the per-feature mean over all recorded months.
pub const OVERALL_AVERAGE_COLUMN: &str = "monthly_average_temp";

/// One feature's recorded monthly averages (Celsius).
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    name: String,
    values: BTreeMap<Month, f64>,
}

impl TableRow {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, month: Month) -> Option<f64> {
        self.values.get(&month).copied()
    }

    /// Recorded months in chronological order.
    pub fn values(&self) -> &BTreeMap<Month, f64> {
        &self.values
    }

    /// Mean of the monthly averages present in this row.
    pub fn overall_average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.values().sum::<f64>() / self.values.len() as f64)
    }
}

/// Rows keep the order features were loaded in; columns are the union of all
/// recorded months. A missing cell means the month had no data for that feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<TableRow>,
    index: HashMap<String, usize>,
}

impl ResultTable {
    /// Creates an empty row per name. Callers guarantee uniqueness.
    pub(crate) fn with_rows<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::default();
        for name in names {
            table.index.insert(name.to_string(), table.rows.len());
            table.rows.push(TableRow {
                name: name.to_string(),
                values: BTreeMap::new(),
            });
        }
        table
    }

    /// Creates or replaces the value of one cell.
    pub(crate) fn set(&mut self, name: &str, month: Month, value: f64) -> Result<(), RegistryError> {
        let row = self
            .index
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownFeature(name.to_string()))?;
        self.rows[row].values.insert(month, value);
        Ok(())
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, name: &str) -> Option<&TableRow> {
        self.index.get(name).map(|&i| &self.rows[i])
    }

    pub fn get(&self, name: &str, month: Month) -> Option<f64> {
        self.row(name).and_then(|row| row.get(month))
    }

    /// Every month recorded for at least one feature, ascending.
    pub fn months(&self) -> Vec<Month> {
        self.rows
            .iter()
            .flat_map(|row| row.values.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table with a `name` column, one nullable `f64` column per
    /// month (named `YYYY-MM`) and [`OVERALL_AVERAGE_COLUMN`].
    pub fn to_dataframe(&self) -> Result<DataFrame, RegistryError> {
        let months = self.months();
        let mut columns = Vec::with_capacity(months.len() + 2);

        let names: Vec<&str> = self.rows.iter().map(|r| r.name.as_str()).collect();
        columns.push(Column::new("name".into(), names));

        for month in months {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.get(month)).collect();
            columns.push(Column::new(month.to_string().into(), values));
        }

        let overall: Vec<Option<f64>> = self.rows.iter().map(|r| r.overall_average()).collect();
        columns.push(Column::new(OVERALL_AVERAGE_COLUMN.into(), overall));

        Ok(DataFrame::new(columns)?)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), RegistryError> {
        let mut df = self.to_dataframe()?;
        let mut file = std::fs::File::create(path)
            .map_err(|e| RegistryError::CsvCreate(path.to_path_buf(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| RegistryError::CsvWrite(path.to_path_buf(), e))
    }
}
