use crate::aggregate::aggregator::MonthlyAverages;
use crate::registry::error::RegistryError;
use crate::registry::result_table::ResultTable;
use crate::types::feature::Feature;
use crate::types::month::Month;
use std::collections::HashSet;

/// The loaded features and the table of averages computed for them.
///
/// Features are fixed at load time. The table is only written through
/// [`FeatureRegistry::record`] and [`FeatureRegistry::record_month`].
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    features: Vec<Feature>,
    table: ResultTable,
}

impl FeatureRegistry {
    /// Fails with [`RegistryError::DuplicateFeature`] if two features share a
    /// name and with [`RegistryError::NonFiniteCentroid`] if a centroid cannot
    /// be matched to any grid cell.
    pub fn load(features: Vec<Feature>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::with_capacity(features.len());
        for feature in &features {
            let centroid = feature.centroid();
            if !centroid.is_finite() {
                return Err(RegistryError::NonFiniteCentroid {
                    name: feature.name().to_string(),
                    lat: centroid.lat(),
                    lon: centroid.lon(),
                });
            }
            if !seen.insert(feature.name()) {
                return Err(RegistryError::DuplicateFeature(feature.name().to_string()));
            }
        }
        let table = ResultTable::with_rows(features.iter().map(Feature::name));
        Ok(Self { features, table })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Stores one average, replacing any earlier value for the same month.
    pub fn record(
        &mut self,
        feature_name: &str,
        month: Month,
        celsius: f64,
    ) -> Result<(), RegistryError> {
        self.table.set(feature_name, month, celsius)
    }

    /// Stores every average of an aggregated month. Returns how many were stored.
    pub fn record_month(&mut self, averages: &MonthlyAverages) -> Result<usize, RegistryError> {
        for average in averages.averages() {
            self.record(&average.name, averages.month(), average.celsius)?;
        }
        Ok(averages.averages().len())
    }

    pub fn export_table(&self) -> &ResultTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregator::aggregate_month;
    use crate::grid::memory::MemoryGridReader;
    use crate::grid::snapshot::GridSnapshot;
    use crate::types::lat_lon::LatLon;
    use std::path::PathBuf;

    fn features() -> Vec<Feature> {
        vec![
            Feature::new("orchard", LatLon(52.1, 5.1)),
            Feature::new("meadow", LatLon(52.3, 4.8)),
        ]
    }

    #[test]
    fn test_unknown_feature_is_rejected() {
        let mut registry = FeatureRegistry::load(features()).unwrap();
        let err = registry.record("vineyard", Month(2023, 1), 3.0).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownFeature(name) if name == "vineyard"));
        assert!(registry.export_table().months().is_empty());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut list = features();
        list.push(Feature::new("orchard", LatLon(0.0, 0.0)));
        assert!(matches!(
            FeatureRegistry::load(list),
            Err(RegistryError::DuplicateFeature(name)) if name == "orchard"
        ));
    }

    #[test]
    fn test_non_finite_centroid_is_rejected() {
        let mut list = features();
        list.push(Feature::new("lost", LatLon(f64::NAN, 101.0)));
        assert!(matches!(
            FeatureRegistry::load(list),
            Err(RegistryError::NonFiniteCentroid { name, .. }) if name == "lost"
        ));
        let infinite = vec![Feature::new("edge", LatLon(21.0, f64::INFINITY))];
        assert!(FeatureRegistry::load(infinite).is_err());
    }

    #[test]
    fn test_record_overwrites_silently() {
        let mut registry = FeatureRegistry::load(features()).unwrap();
        registry.record("meadow", Month(2023, 1), 3.0).unwrap();
        registry.record("meadow", Month(2023, 1), 4.5).unwrap();
        let table = registry.export_table();
        assert_eq!(table.get("meadow", Month(2023, 1)), Some(4.5));
        assert_eq!(table.row("meadow").unwrap().values().len(), 1);
    }

    #[test]
    fn test_export_keeps_load_order() {
        let mut registry = FeatureRegistry::load(features()).unwrap();
        registry.record("meadow", Month(2023, 3), 8.0).unwrap();
        registry.record("orchard", Month(2023, 1), 2.0).unwrap();
        let table = registry.export_table();
        let names: Vec<&str> = table.rows().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["orchard", "meadow"]);
        assert_eq!(table.months(), vec![Month(2023, 1), Month(2023, 3)]);
        assert_eq!(table.get("orchard", Month(2023, 3)), None);
    }

    #[test]
    fn test_rerunning_a_month_is_idempotent() {
        let snapshot = |k: f64| {
            GridSnapshot::from_rows(
                None,
                vec![52.0, 52.5],
                vec![4.5, 5.0],
                vec![vec![k, k], vec![k, k]],
            )
            .unwrap()
        };
        let reader = MemoryGridReader::new()
            .with("d1.nc", snapshot(275.15))
            .with("d2.nc", snapshot(277.15));
        let files: Vec<PathBuf> = vec!["d1.nc".into(), "d2.nc".into()];
        let mut registry = FeatureRegistry::load(features()).unwrap();

        let first = aggregate_month(&reader, Month(2023, 2), &files, registry.features()).unwrap();
        assert_eq!(registry.record_month(&first).unwrap(), 2);
        let before = registry.export_table().clone();

        let second = aggregate_month(&reader, Month(2023, 2), &files, registry.features()).unwrap();
        registry.record_month(&second).unwrap();

        assert_eq!(registry.export_table(), &before);
        let value = registry.export_table().get("orchard", Month(2023, 2)).unwrap();
        assert!((value - 3.0).abs() < 1e-9);
    }
}
