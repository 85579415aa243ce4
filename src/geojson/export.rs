use crate::geojson::collection::{FeatureCollection, GeoFeature, NAME_PROPERTY};
use crate::registry::result_table::{ResultTable, OVERALL_AVERAGE_COLUMN};
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashSet;

fn average_value(value: Option<f64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

/// Joins the table onto the collection by feature name.
///
/// Every feature gets one property per table month (`YYYY-MM`, `null` when
/// absent) plus [`OVERALL_AVERAGE_COLUMN`]. Table rows without a matching
/// feature are appended with a null geometry, so no computed value is lost.
pub fn merge_results(collection: &FeatureCollection, table: &ResultTable) -> FeatureCollection {
    let months = table.months();
    let mut merged = collection.clone();
    let mut matched = HashSet::new();

    for feature in &mut merged.features {
        let row = feature.name().and_then(|name| table.row(name));
        if let Some(row) = row {
            matched.insert(row.name().to_string());
        }
        let properties = feature.properties.get_or_insert_with(Map::new);
        for month in &months {
            properties.insert(
                month.to_string(),
                average_value(row.and_then(|r| r.get(*month))),
            );
        }
        properties.insert(
            OVERALL_AVERAGE_COLUMN.to_string(),
            average_value(row.and_then(|r| r.overall_average())),
        );
    }

    for row in table.rows().iter().filter(|r| !matched.contains(r.name())) {
        debug!("Appending '{}' without geometry", row.name());
        let mut properties = Map::new();
        properties.insert(NAME_PROPERTY.to_string(), Value::from(row.name()));
        for month in &months {
            properties.insert(month.to_string(), average_value(row.get(*month)));
        }
        properties.insert(
            OVERALL_AVERAGE_COLUMN.to_string(),
            average_value(row.overall_average()),
        );
        merged.features.push(GeoFeature::new(None, properties));
    }

    merged
}
