pub mod centroid;
pub mod collection;
pub mod error;
pub mod export;
