use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{FetchError, ReportApi};
use crate::domain::{ReportRequest, ReportResult, ResourcesRequest};

#[derive(Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    data: Option<ReportResult>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    description: Option<String>,
}

/// HTTP client for the utilization reporting service.
///
/// Uses the transport's default timeout and never retries; a failed call is
/// reported to the caller, who decides whether to resubmit.
#[derive(Clone)]
pub struct HttpReportClient {
    client: Client,
    base_url: String,
    auth_bearer_token: Option<String>,
}

impl HttpReportClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth_bearer_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn subscription_url(&self, customer_id: &str, subscription_id: &str, tail: &str) -> String {
        format!(
            "{}/customers/{}/subscriptions/{}/{}",
            self.base_url, customer_id, subscription_id, tail
        )
    }

    async fn get_items(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<ReportResult, FetchError> {
        let mut builder = self.client.get(url).query(query);
        if let Some(token) = &self.auth_bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = %e, url, "reporting service request failed");
            FetchError::Transport(format!("failed to reach reporting service: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            FetchError::Transport(format!("failed to read reporting service response: {e}"))
        })?;

        let report = interpret_response(status, &body)?;
        tracing::debug!(url, items = report.len(), "reporting service returned items");
        Ok(report)
    }
}

fn interpret_response(status: StatusCode, body: &str) -> Result<ReportResult, FetchError> {
    let parsed = serde_json::from_str::<ApiEnvelope>(body);

    if let Ok(ApiEnvelope {
        error: Some(err), ..
    }) = &parsed
    {
        let description = err
            .description
            .clone()
            .unwrap_or_else(|| "reporting service reported an error".to_string());
        tracing::warn!(status = status.as_u16(), %description, "reporting service error");
        return Err(FetchError::Service {
            status: status.as_u16(),
            description,
        });
    }

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "reporting service returned failure status");
        return Err(FetchError::Service {
            status: status.as_u16(),
            description: format!("reporting service returned {status}"),
        });
    }

    match parsed {
        Ok(ApiEnvelope {
            data: Some(report), ..
        }) => Ok(report),
        Ok(_) => Err(FetchError::Decode(
            "reporting service response carried no data".to_string(),
        )),
        Err(e) => Err(FetchError::Decode(format!(
            "invalid reporting service response: {e}"
        ))),
    }
}

#[async_trait::async_trait]
impl ReportApi for HttpReportClient {
    async fn fetch_report(&self, request: &ReportRequest) -> Result<ReportResult, FetchError> {
        let url = self.subscription_url(
            &request.customer_id,
            &request.subscription_id,
            "utilizations/azure",
        );
        let query = [
            ("start_time", request.start.to_string()),
            ("end_time", request.end.to_string()),
            ("granularity", request.granularity.to_string()),
            ("show_details", request.detailed.to_string()),
        ];

        tracing::info!(
            customer_id = %request.customer_id,
            subscription_id = %request.subscription_id,
            start = %request.start,
            end = %request.end,
            granularity = %request.granularity,
            detailed = request.detailed,
            "requesting utilization report"
        );
        self.get_items(&url, &query).await
    }

    async fn fetch_resources(
        &self,
        request: &ResourcesRequest,
    ) -> Result<ReportResult, FetchError> {
        let url = self.subscription_url(
            &request.customer_id,
            &request.subscription_id,
            "resources",
        );

        tracing::info!(
            customer_id = %request.customer_id,
            subscription_id = %request.subscription_id,
            "requesting resource list"
        );
        self.get_items(&url, &[]).await
    }
}
