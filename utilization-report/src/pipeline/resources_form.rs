use report_client::{FetchError, ReportApi, ReportResult, ResourcesRequest};

use super::{
    Alert, BeginSubmit, Severity, Submission, SubmissionState, SubmitOutcome, Ticket, ViewState,
};
use crate::validation::{validate_identifiers, Field, ValidationError};

/// The "My Resources" screen: two identifiers, one lookup.
///
/// Unlike the report form, identifier inputs are locked while loading.
#[derive(Default)]
pub struct ResourcesForm {
    customer_id: String,
    subscription_id: String,
    customer_id_error: Option<ValidationError>,
    subscription_id_error: Option<ValidationError>,
    alert: Option<Alert>,
    submission: Submission<ResourcesRequest>,
}

impl ResourcesForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignored while a lookup is in flight.
    pub fn set_customer_id(&mut self, raw: &str) {
        if !self.submission.is_loading() {
            self.customer_id = raw.trim().to_string();
        }
    }

    /// Ignored while a lookup is in flight.
    pub fn set_subscription_id(&mut self, raw: &str) {
        if !self.submission.is_loading() {
            self.subscription_id = raw.trim().to_string();
        }
    }

    pub fn state(&self) -> &SubmissionState<ResourcesRequest> {
        self.submission.state()
    }

    pub fn resources(&self) -> Option<&ReportResult> {
        self.submission.report().map(|(_, report)| report)
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn view(&self) -> ViewState {
        let loading = self.submission.is_loading();
        ViewState {
            customer_id_error: self.customer_id_error.map(|e| e.to_string()),
            subscription_id_error: self.subscription_id_error.map(|e| e.to_string()),
            alert: self.alert.clone(),
            loading,
            submit_enabled: !loading,
            inputs_enabled: !loading,
            download_visible: false,
        }
    }

    pub fn begin_submit(&mut self) -> BeginSubmit<ResourcesRequest> {
        if self.submission.is_loading() {
            return BeginSubmit::Busy;
        }
        metrics::counter!("resources_submissions_total").increment(1);

        let validation = validate_identifiers(&self.customer_id, &self.subscription_id);
        self.customer_id_error = validation.error_for(Field::CustomerId);
        self.subscription_id_error = validation.error_for(Field::SubscriptionId);
        if !validation.is_valid() {
            metrics::counter!("resources_validation_rejected_total").increment(1);
            tracing::info!(errors = ?validation.errors, "resources submission rejected");
            return BeginSubmit::Rejected(validation);
        }

        let request = ResourcesRequest {
            customer_id: self.customer_id.clone(),
            subscription_id: self.subscription_id.clone(),
        };
        match self.submission.begin(request.clone()) {
            Some(ticket) => {
                self.alert = None;
                BeginSubmit::Started { ticket, request }
            }
            None => BeginSubmit::Busy,
        }
    }

    pub fn complete(&mut self, ticket: Ticket, result: Result<ReportResult, FetchError>) -> bool {
        if !self.submission.complete(ticket, result) {
            tracing::warn!(?ticket, "ignoring completion of a lookup that is not in flight");
            return false;
        }

        match self.submission.state() {
            SubmissionState::Success { report, .. } => {
                self.alert = Some(Alert::new(
                    Severity::Success,
                    "Resources Loaded",
                    format!("Found {} resources", report.len()),
                ));
            }
            SubmissionState::Failed { error, .. } => {
                metrics::counter!("resources_fetch_failed_total").increment(1);
                tracing::error!(error = %error, "resource lookup failed");
                self.alert = Some(Alert::error(error.description()));
            }
            _ => {}
        }
        true
    }

    pub async fn submit<A>(&mut self, api: &A) -> SubmitOutcome
    where
        A: ReportApi + ?Sized,
    {
        let (ticket, request) = match self.begin_submit() {
            BeginSubmit::Busy => return SubmitOutcome::Busy,
            BeginSubmit::Rejected(validation) => return SubmitOutcome::Rejected(validation),
            BeginSubmit::Started { ticket, request } => (ticket, request),
        };

        let result = api.fetch_resources(&request).await;
        let outcome = match &result {
            Ok(report) => SubmitOutcome::Succeeded {
                items: report.len(),
            },
            Err(err) => SubmitOutcome::Failed(err.clone()),
        };
        self.complete(ticket, result);
        outcome
    }
}
