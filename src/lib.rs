pub mod checker;
pub mod config;
pub mod executor;
pub mod model;
pub mod raw;
pub mod telemetry;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export common types for convenience
pub use checker::*;
pub use config::CollectorConfig;
pub use executor::CollectorExecutor;
pub use model::*;
pub use raw::{CollectorError, ErrorKind, RawCollector};
pub use traits::*;
