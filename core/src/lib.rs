pub mod anomaly;
pub mod api;
pub mod audit;
pub mod categorize;
pub mod config;
pub mod determinism;
pub mod disputes;
pub mod documents;
pub mod extraction;
pub mod insights;
pub mod ledger;
pub mod pipeline;
pub mod telemetry;

pub mod error;

pub use config::PipelineConfig;
pub use error::{CoreError, CoreResult, ErrorKind};
pub use pipeline::manager::DocumentManager;
