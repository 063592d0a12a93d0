pub mod report_queries;

use crate::domain::{ReportRequest, ReportResult, ResourcesRequest};

pub use report_queries::HttpReportClient;

/// Failure of a reporting API call. `Display` is the human-readable
/// description shown to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{0}")]
    Transport(String),
    #[error("{description}")]
    Service { status: u16, description: String },
    #[error("{0}")]
    Decode(String),
}

impl FetchError {
    pub fn description(&self) -> String {
        self.to_string()
    }
}

/// The remote reporting service. Every call performs exactly one request.
#[async_trait::async_trait]
pub trait ReportApi: Send + Sync {
    async fn fetch_report(&self, request: &ReportRequest) -> Result<ReportResult, FetchError>;

    async fn fetch_resources(
        &self,
        request: &ResourcesRequest,
    ) -> Result<ReportResult, FetchError>;
}
