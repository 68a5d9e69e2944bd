//! Pipeline orchestration module.

mod orchestrator;
mod report;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use report::RunReport;
