pub mod cli;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod parser;

pub use error::{Result, TelemetryError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
