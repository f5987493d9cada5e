pub mod backend;
pub mod config;

pub use backend::SqliteBackend;
pub use config::StorageConfig;
