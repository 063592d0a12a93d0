pub mod api;
pub mod domain;

pub use api::{FetchError, HttpReportClient, ReportApi};
pub use domain::{Granularity, ReportRequest, ReportResult, ResourcesRequest, UsageRecord};
