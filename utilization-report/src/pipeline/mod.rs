pub mod report_form;
pub mod resources_form;

use report_client::{FetchError, ReportResult};

use crate::validation::ValidationResult;

pub use report_form::{report_filename, FormInput, ReportForm};
pub use resources_form::ResourcesForm;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("no report is available for download")]
    NotReady,
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

/// Identifies the single fetch a form is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Lifecycle of one form's submissions. `Q` is the request that was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState<Q> {
    Idle,
    Loading { ticket: Ticket, request: Q },
    Success { request: Q, report: ReportResult },
    Failed { request: Q, error: FetchError },
}

/// Owns a [`SubmissionState`] and allows at most one fetch in flight.
#[derive(Debug)]
pub struct Submission<Q> {
    state: SubmissionState<Q>,
    next_ticket: u64,
}

impl<Q> Default for Submission<Q> {
    fn default() -> Self {
        Self {
            state: SubmissionState::Idle,
            next_ticket: 0,
        }
    }
}

impl<Q> Submission<Q> {
    pub fn state(&self) -> &SubmissionState<Q> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SubmissionState::Loading { .. })
    }

    /// Enter `Loading`, discarding any earlier result. Returns `None` while a
    /// fetch is already in flight.
    pub fn begin(&mut self, request: Q) -> Option<Ticket> {
        if self.is_loading() {
            return None;
        }
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.state = SubmissionState::Loading { ticket, request };
        Some(ticket)
    }

    /// Resolve the in-flight fetch. A ticket that does not match the current
    /// `Loading` state is ignored and `false` returned.
    pub fn complete(&mut self, ticket: Ticket, result: Result<ReportResult, FetchError>) -> bool {
        match std::mem::replace(&mut self.state, SubmissionState::Idle) {
            SubmissionState::Loading {
                ticket: current,
                request,
            } if current == ticket => {
                self.state = match result {
                    Ok(report) => SubmissionState::Success { request, report },
                    Err(error) => SubmissionState::Failed { request, error },
                };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// The request and report of a successful submission.
    pub fn report(&self) -> Option<(&Q, &ReportResult)> {
        match &self.state {
            SubmissionState::Success { request, report } => Some((request, report)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Info,
    Success,
}

/// Banner shown above a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Alert {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, "Error", message)
    }
}

/// What the rendering surface needs to draw a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub customer_id_error: Option<String>,
    pub subscription_id_error: Option<String>,
    pub alert: Option<Alert>,
    pub loading: bool,
    pub submit_enabled: bool,
    pub inputs_enabled: bool,
    pub download_visible: bool,
}

/// Result of starting a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum BeginSubmit<Q> {
    /// A fetch is already in flight; the trigger was ignored.
    Busy,
    /// Validation failed; nothing was sent.
    Rejected(ValidationResult),
    /// The form is `Loading`; the caller must run `request` and hand the
    /// result back together with `ticket`.
    Started { ticket: Ticket, request: Q },
}

/// Result of a full submit cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Busy,
    Rejected(ValidationResult),
    Succeeded { items: usize },
    Failed(FetchError),
}
