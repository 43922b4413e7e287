pub mod config;
pub mod constants;
pub mod error;
pub mod idempotency;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod storage;
pub mod summary;
pub mod types;

// Ports and their adapters
pub mod app;
pub mod infra;

pub use config::DatasetConfig;
pub use error::{DatasetError, Result};
pub use pipeline::FgNet;
