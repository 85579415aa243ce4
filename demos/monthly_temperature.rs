//! Usage:
//!
//! ```text
//! cargo run --example monthly_temperature --features netcdf -- \
//!     fields.geojson 2023-01-01 2023-03-31 result.geojson [grid_dir]
//! ```
//!
//! Without `grid_dir` the daily grids are requested from the Climate Data
//! Store, which needs `CDSAPI_URL`/`CDSAPI_KEY` or a `~/.cdsapirc`. With it,
//! already downloaded NetCDF files under that directory are used instead.

use chrono::NaiveDate;
use geotemp::{
    discover_grid_files, CdsClient, FeatureCollection, FeatureRegistry, GeoTempError,
    Month, NetCdfReader, TemperaturePipeline,
};
use std::env;
use std::path::PathBuf;

fn parse_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|e| {
        eprintln!("'{}' is not a YYYY-MM-DD date: {}", value, e);
        std::process::exit(2)
    })
}

#[tokio::main]
async fn main() -> Result<(), GeoTempError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        eprintln!(
            "usage: {} <features.geojson> <start> <end> <output.geojson> [grid_dir]",
            args[0]
        );
        std::process::exit(2);
    }
    let input = PathBuf::from(&args[1]);
    let start = parse_date(&args[2]);
    let end = parse_date(&args[3]);
    let output = PathBuf::from(&args[4]);

    let collection = FeatureCollection::from_path(&input)?;
    let registry = FeatureRegistry::load(collection.to_features()?)?;
    println!("Loaded {} features from {}", registry.len(), input.display());

    let mut pipeline = TemperaturePipeline::builder()
        .registry(registry)
        .reader(NetCdfReader::default())
        .build()?;

    let report = match args.get(5) {
        Some(grid_dir) => {
            let mut files = discover_grid_files(&PathBuf::from(grid_dir))?;
            let (first, last) = (Month::of(start), Month::of(end));
            files.retain(|month, _| first <= *month && *month <= last);
            pipeline.aggregate_local(files).await?
        }
        None => {
            let Some(bounds) = collection.total_bounds() else {
                eprintln!("{} has no coordinates", input.display());
                std::process::exit(1);
            };
            let area = bounds.request_area();
            println!("Requesting area {:?}", area.as_array());
            let client = CdsClient::builder().build()?;
            pipeline.run(&client, area, start, end).await?
        }
    };

    for summary in &report.completed {
        println!(
            "{}: {} files read, {} skipped, {} features in {:?}",
            summary.month,
            summary.files_read,
            summary.files_skipped,
            summary.features_recorded,
            summary.elapsed
        );
    }
    for failure in &report.failed {
        println!("{}: failed: {}", failure.month, failure.error);
    }

    println!("{:#?}", pipeline.registry().export_table().to_dataframe()?);
    pipeline.write_geojson(&collection, &output)?;
    println!("Wrote {}", output.display());
    Ok(())
}
