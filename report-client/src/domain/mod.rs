pub mod report_request;
pub mod usage_record;

pub use report_request::{Granularity, ParseGranularityError, ReportRequest, ResourcesRequest};
pub use usage_record::{ReportResult, UsageRecord};
