pub mod json_store;
pub mod recorder;
pub mod schema;
