pub mod config;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod transform;
pub mod validation;

pub use pipeline::{ReportForm, ResourcesForm, SubmissionState, ViewState};
