pub mod error;
pub mod feature_registry;
pub mod result_table;
