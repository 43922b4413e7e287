// Dataset pipeline: acquire, label + normalize, split

pub mod acquire;
pub mod label;
pub mod normalize;
pub mod orchestrator;
pub mod split;

pub use orchestrator::{run_download, run_process, run_split, FgNet, PipelineReport};

use serde::Serialize;

/// Whether a stage did work or found it already done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageOutcome {
    Completed,
    Skipped,
}
