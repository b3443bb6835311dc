pub mod as_path;
pub mod probe_result;
pub mod report;

pub use as_path::AsPath;
pub use probe_result::{ProbeFailure, ProbeOutcome, ProbeResult};
pub use report::{AsReport, FailureReport, PathGroup, RttSummary, ScanSession};
