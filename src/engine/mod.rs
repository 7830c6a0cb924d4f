pub mod catalog;
pub mod combo;
pub mod error;
pub mod matcher;
pub mod pool;
pub mod timer;

pub use error::{CatalogError, SessionError};
