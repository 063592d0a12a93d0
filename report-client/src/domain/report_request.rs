use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

/// Time bucketing of the utilization report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Hourly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown granularity '{0}', expected 'daily' or 'hourly'")]
pub struct ParseGranularityError(pub String);

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "hourly" => Ok(Self::Hourly),
            _ => Err(ParseGranularityError(s.to_string())),
        }
    }
}

/// Parameters of one utilization report call. Only built from input that
/// already passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub customer_id: String,
    pub subscription_id: String,
    pub start: Date,
    pub end: Date,
    pub granularity: Granularity,
    pub detailed: bool,
}

/// Parameters of a resource listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesRequest {
    pub customer_id: String,
    pub subscription_id: String,
}
