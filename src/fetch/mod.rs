pub mod archive;
pub mod cds_client;
pub mod credentials;
pub mod error;
pub mod fetcher;
