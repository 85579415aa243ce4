mod aggregate;
mod error;
mod fetch;
mod geojson;
mod grid;
mod pipeline;
mod registry;
mod types;
mod utils;

pub use error::GeoTempError;
pub use pipeline::*;

pub use types::bbox::{BoundingBox, RequestArea};
pub use types::feature::Feature;
pub use types::lat_lon::LatLon;
pub use types::month::{date_from_file_name, days_by_month, Month};

pub use grid::axis::GridAxis;
pub use grid::memory::MemoryGridReader;
#[cfg(feature = "netcdf")]
pub use grid::netcdf_reader::{NetCdfReader, DEFAULT_FIELD_VARIABLE};
pub use grid::reader::GridReader;
pub use grid::resolver::{
    assign, nearest_index, resolve, AssignmentCache, CellIndex, GridSignature, NearestAssignment,
};
pub use grid::snapshot::GridSnapshot;

pub use aggregate::aggregator::{
    aggregate_month, FeatureAverage, MonthlyAggregator, MonthlyAverages, KELVIN_OFFSET,
};

pub use registry::feature_registry::FeatureRegistry;
pub use registry::result_table::{ResultTable, TableRow, OVERALL_AVERAGE_COLUMN};

pub use geojson::centroid::centroid;
pub use geojson::collection::{FeatureCollection, GeoFeature, Geometry, Position, NAME_PROPERTY};
pub use geojson::export::merge_results;

pub use fetch::archive::{discover_grid_files, extract_archive};
pub use fetch::cds_client::{CdsClient, DATASET};
pub use fetch::credentials::CdsCredentials;
pub use fetch::fetcher::{FetchRequest, GridFetcher};

pub use aggregate::error::AggregateError;
pub use fetch::error::FetchError;
pub use geojson::error::GeoJsonError;
pub use grid::error::GridError;
pub use registry::error::RegistryError;
