pub mod axis;
pub mod error;
pub mod memory;
#[cfg(feature = "netcdf")]
pub mod netcdf_reader;
pub mod reader;
pub mod resolver;
pub mod snapshot;
