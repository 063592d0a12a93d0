use report_client::{Granularity, ReportApi, ReportRequest, ReportResult};
use time::{Date, Month, OffsetDateTime};

use super::{
    Alert, BeginSubmit, ExportError, Severity, Submission, SubmissionState, SubmitOutcome, Ticket,
    ViewState,
};
use crate::{
    sinks::{DownloadSink, ExportFile, CSV_MIME_TYPE},
    transform::CsvExporter,
    validation::{validate_report_input, Field, ValidationError},
};

const REPORT_GENERATED_TITLE: &str = "Report Generated";
const REPORT_GENERATED_MESSAGE: &str =
    "The report has been generated and can be downloaded as .csv file";
const LONG_RANGE_TITLE: &str = "Please Note";

/// Raw field values of the "Generate Report" screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    pub customer_id: String,
    pub subscription_id: String,
    pub start_date: Date,
    pub end_date: Date,
    pub granularity: Granularity,
    pub detailed: bool,
}

impl FormInput {
    /// Empty identifiers and the month leading up to `today`.
    pub fn with_defaults(today: Date) -> Self {
        Self {
            customer_id: String::new(),
            subscription_id: String::new(),
            start_date: one_month_before(today),
            end_date: today,
            granularity: Granularity::Daily,
            detailed: false,
        }
    }
}

/// Same day one calendar month earlier, clamped to the length of that month.
pub fn one_month_before(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::January => (date.year() - 1, Month::December),
        m => (date.year(), m.previous()),
    };
    let day = date.day().min(time::util::days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// `UtilizationReport_<dd-MM start>_<dd-MM end>.csv`
pub fn report_filename(start: Date, end: Date) -> String {
    format!(
        "UtilizationReport_{:02}-{:02}_{:02}-{:02}.csv",
        start.day(),
        u8::from(start.month()),
        end.day(),
        u8::from(end.month()),
    )
}

/// The "Generate Report" screen: validate, fetch, and export as CSV.
pub struct ReportForm {
    input: FormInput,
    today: Date,
    customer_id_error: Option<ValidationError>,
    subscription_id_error: Option<ValidationError>,
    alert: Option<Alert>,
    submission: Submission<ReportRequest>,
    exporter: CsvExporter,
}

impl ReportForm {
    pub fn new(today: Date) -> Self {
        Self {
            input: FormInput::with_defaults(today),
            today,
            customer_id_error: None,
            subscription_id_error: None,
            alert: None,
            submission: Submission::default(),
            exporter: CsvExporter::default(),
        }
    }

    pub fn for_today() -> Self {
        Self::new(OffsetDateTime::now_utc().date())
    }

    pub fn with_exporter(mut self, exporter: CsvExporter) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn input(&self) -> &FormInput {
        &self.input
    }

    pub fn set_customer_id(&mut self, raw: &str) {
        self.input.customer_id = raw.trim().to_string();
    }

    pub fn set_subscription_id(&mut self, raw: &str) {
        self.input.subscription_id = raw.trim().to_string();
    }

    pub fn set_start_date(&mut self, date: Date) {
        self.input.start_date = date;
    }

    pub fn set_end_date(&mut self, date: Date) {
        self.input.end_date = date;
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.input.granularity = granularity;
    }

    pub fn set_detailed(&mut self, detailed: bool) {
        self.input.detailed = detailed;
    }

    pub fn state(&self) -> &SubmissionState<ReportRequest> {
        self.submission.state()
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
            inputs_enabled: true,
            download_visible: self.submission.report().is_some(),
        }
    }

    /// Validate the current input and, if it passes, enter `Loading`.
    pub fn begin_submit(&mut self) -> BeginSubmit<ReportRequest> {
        if self.submission.is_loading() {
            tracing::debug!("submit ignored while a report is loading");
            return BeginSubmit::Busy;
        }
        metrics::counter!("report_submissions_total").increment(1);

        let validation = validate_report_input(
            &self.input.customer_id,
            &self.input.subscription_id,
            self.input.start_date,
            self.input.end_date,
            self.today,
        );
        self.customer_id_error = validation.error_for(Field::CustomerId);
        self.subscription_id_error = validation.error_for(Field::SubscriptionId);

        if !validation.is_valid() {
            self.alert = validation
                .error_for(Field::DateRange)
                .map(|err| Alert::error(err.to_string()));
            metrics::counter!("report_validation_rejected_total").increment(1);
            tracing::info!(errors = ?validation.errors, "report submission rejected");
            return BeginSubmit::Rejected(validation);
        }

        let request = ReportRequest {
            customer_id: self.input.customer_id.trim().to_string(),
            subscription_id: self.input.subscription_id.trim().to_string(),
            start: self.input.start_date,
            end: self.input.end_date,
            granularity: self.input.granularity,
            detailed: self.input.detailed,
        };

        match self.submission.begin(request.clone()) {
            Some(ticket) => {
                self.alert = validation
                    .warning
                    .map(|message| Alert::new(Severity::Info, LONG_RANGE_TITLE, message));
                BeginSubmit::Started { ticket, request }
            }
            None => BeginSubmit::Busy,
        }
    }

    /// Hand back the result of the fetch started by [`Self::begin_submit`].
    /// Returns `false` if `ticket` is not the fetch in flight.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<ReportResult, report_client::FetchError>,
    ) -> bool {
        if !self.submission.complete(ticket, result) {
            tracing::warn!(?ticket, "ignoring completion of a fetch that is not in flight");
            return false;
        }

        match self.submission.state() {
            SubmissionState::Success { report, .. } => {
                tracing::info!(items = report.len(), "utilization report generated");
                self.alert = Some(Alert::new(
                    Severity::Success,
                    REPORT_GENERATED_TITLE,
                    REPORT_GENERATED_MESSAGE,
                ));
            }
            SubmissionState::Failed { error, .. } => {
                metrics::counter!("report_fetch_failed_total").increment(1);
                tracing::error!(error = %error, "utilization report request failed");
                self.alert = Some(Alert::error(error.description()));
            }
            _ => {}
        }
        true
    }

    /// Validate, fetch and record the outcome in one call.
    pub async fn submit<A>(&mut self, api: &A) -> SubmitOutcome
    where
        A: ReportApi + ?Sized,
    {
        let (ticket, request) = match self.begin_submit() {
            BeginSubmit::Busy => return SubmitOutcome::Busy,
            BeginSubmit::Rejected(validation) => return SubmitOutcome::Rejected(validation),
            BeginSubmit::Started { ticket, request } => (ticket, request),
        };

        let result = api.fetch_report(&request).await;
        let outcome = match &result {
            Ok(report) => SubmitOutcome::Succeeded {
                items: report.len(),
            },
            Err(err) => SubmitOutcome::Failed(err.clone()),
        };
        self.complete(ticket, result);
        outcome
    }

    /// Serialize the current report. Only available after a successful fetch.
    pub fn export(&self) -> Result<ExportFile, ExportError> {
        let (request, report) = self.submission.report().ok_or(ExportError::NotReady)?;
        let content = self.exporter.to_csv(report, request.detailed)?;

        Ok(ExportFile {
            content,
            filename: report_filename(request.start, request.end),
            mime_type: CSV_MIME_TYPE,
        })
    }

    /// Serialize the current report and hand it to `sink`.
    pub fn export_to(&self, sink: &dyn DownloadSink) -> Result<ExportFile, ExportError> {
        let file = self.export()?;
        sink.save(&file)?;
        metrics::counter!("report_exports_total").increment(1);
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_client::{FetchError, ResourcesRequest};
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };
    use time::macros::date;

    const VALID: &str = "12345678-1234-1234-1234-123456789012";

    struct StubApi {
        result: Result<ReportResult, FetchError>,
        calls: AtomicUsize,
    }

    impl StubApi {
        fn returning(result: Result<ReportResult, FetchError>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ReportApi for StubApi {
        async fn fetch_report(&self, _request: &ReportRequest) -> Result<ReportResult, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        async fn fetch_resources(
            &self,
            _request: &ResourcesRequest,
        ) -> Result<ReportResult, FetchError> {
            unreachable!("report form never lists resources")
        }
    }

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<ExportFile>>,
    }

    impl DownloadSink for MemorySink {
        fn save(&self, file: &ExportFile) -> Result<(), ExportError> {
            self.saved.lock().unwrap().push(file.clone());
            Ok(())
        }
    }

    fn report() -> ReportResult {
        serde_json::from_value(json!({
            "items": [
                {
                    "usageStartTime": "2024-01-01T00:00:00Z",
                    "resource": { "id": "r-1", "name": "vm" },
                    "quantity": 24,
                    "instanceData": { "location": "westus" }
                }
            ]
        }))
        .unwrap()
    }

    fn filled_form(start: Date, end: Date) -> ReportForm {
        let mut form = ReportForm::new(date!(2024 - 06 - 01));
        form.set_customer_id(VALID);
        form.set_subscription_id(&format!("  {}  ", VALID.to_uppercase()));
        form.set_start_date(start);
        form.set_end_date(end);
        form
    }

    #[test]
    fn defaults_cover_previous_month() {
        let input = FormInput::with_defaults(date!(2024 - 03 - 31));
        assert_eq!(input.start_date, date!(2024 - 02 - 29));
        assert_eq!(input.end_date, date!(2024 - 03 - 31));
        assert_eq!(input.granularity, Granularity::Daily);
        assert!(!input.detailed);

        assert_eq!(one_month_before(date!(2024 - 01 - 15)), date!(2023 - 12 - 15));
    }

    #[test]
    fn filename_embeds_day_and_month() {
        assert_eq!(
            report_filename(date!(2024 - 01 - 01), date!(2024 - 01 - 31)),
            "UtilizationReport_01-01_31-01.csv"
        );
    }

    #[tokio::test]
    async fn valid_submission_reaches_success_and_exports() {
        let api = StubApi::returning(Ok(report()));
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 01 - 31));

        let outcome = form.submit(&api).await;

        assert_eq!(outcome, SubmitOutcome::Succeeded { items: 1 });
        assert_eq!(api.calls(), 1);
        assert!(matches!(form.state(), SubmissionState::Success { .. }));

        let view = form.view();
        assert!(view.download_visible);
        assert!(view.submit_enabled);
        assert_eq!(view.customer_id_error, None);
        assert_eq!(
            view.alert,
            Some(Alert::new(
                Severity::Success,
                REPORT_GENERATED_TITLE,
                REPORT_GENERATED_MESSAGE
            ))
        );

        let sink = MemorySink::default();
        let file = form.export_to(&sink).unwrap();
        assert_eq!(file.filename, "UtilizationReport_01-01_31-01.csv");
        assert_eq!(file.mime_type, "text/csv");
        assert!(file.content.starts_with("usageStartTime,resource.id,resource.name,quantity\n"));
        assert_eq!(sink.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_customer_id_blocks_fetch() {
        let api = StubApi::returning(Ok(report()));
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 01 - 31));
        form.set_customer_id("   ");

        let outcome = form.submit(&api).await;

        match outcome {
            SubmitOutcome::Rejected(validation) => {
                assert!(!validation.customer_id_valid);
                assert!(validation.subscription_id_valid);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(api.calls(), 0);
        assert_eq!(form.state(), &SubmissionState::Idle);
        assert_eq!(
            form.view().customer_id_error.as_deref(),
            Some("Please enter a valid Customer ID")
        );
        assert_eq!(form.view().alert, None);
    }

    #[tokio::test]
    async fn same_day_range_shows_error_and_skips_fetch() {
        let api = StubApi::returning(Ok(report()));
        let mut form = filled_form(date!(2024 - 02 - 10), date!(2024 - 02 - 10));

        let outcome = form.submit(&api).await;

        assert!(matches!(outcome, SubmitOutcome::Rejected(ref v) if !v.date_range_valid));
        assert_eq!(api.calls(), 0);
        assert_eq!(
            form.alert(),
            Some(&Alert::error(
                "Please make sure start date is at least 1 day before the end date"
            ))
        );
    }

    #[test]
    fn fixed_range_clears_stale_range_banner() {
        let mut form = filled_form(date!(2024 - 02 - 10), date!(2024 - 02 - 10));
        assert!(matches!(form.begin_submit(), BeginSubmit::Rejected(_)));
        assert!(form.alert().is_some());

        // Range corrected, but the customer id is now wrong.
        form.set_end_date(date!(2024 - 02 - 20));
        form.set_customer_id("not-an-id");
        assert!(matches!(form.begin_submit(), BeginSubmit::Rejected(_)));

        let view = form.view();
        assert_eq!(view.alert, None);
        assert_eq!(
            view.customer_id_error.as_deref(),
            Some("Please enter a valid Customer ID")
        );
    }

    #[test]
    fn long_range_warns_and_still_starts_fetch() {
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 03 - 15));

        let begun = form.begin_submit();

        assert!(matches!(begun, BeginSubmit::Started { .. }));
        let view = form.view();
        assert!(view.loading);
        assert!(!view.submit_enabled);
        let alert = view.alert.unwrap();
        assert_eq!(alert.severity, Severity::Info);
        assert_eq!(alert.title, LONG_RANGE_TITLE);
    }

    #[tokio::test]
    async fn long_range_submission_invokes_fetch() {
        let api = StubApi::returning(Ok(report()));
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 03 - 15));

        let outcome = form.submit(&api).await;

        assert_eq!(outcome, SubmitOutcome::Succeeded { items: 1 });
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_shows_description_and_hides_download() {
        let api = StubApi::returning(Err(FetchError::Service {
            status: 429,
            description: "quota exceeded".to_string(),
        }));
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 01 - 31));

        let outcome = form.submit(&api).await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert!(matches!(form.state(), SubmissionState::Failed { .. }));
        let view = form.view();
        assert!(!view.download_visible);
        let alert = view.alert.unwrap();
        assert_eq!(alert.message, "quota exceeded");
        assert_eq!(alert.severity, Severity::Error);
        assert!(matches!(form.export(), Err(ExportError::NotReady)));
    }

    #[test]
    fn second_submit_while_loading_is_ignored() {
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 01 - 31));

        let ticket = match form.begin_submit() {
            BeginSubmit::Started { ticket, .. } => ticket,
            other => panic!("unexpected: {other:?}"),
        };
        assert_eq!(form.begin_submit(), BeginSubmit::Busy);
        assert!(matches!(form.export(), Err(ExportError::NotReady)));

        // Edits while loading do not change the request in flight.
        form.set_detailed(true);
        assert!(form.complete(ticket, Ok(report())));
        let file = form.export().unwrap();
        assert!(!file.content.contains("instanceData.location"));
    }

    #[test]
    fn export_is_rejected_before_any_submission() {
        let form = ReportForm::new(date!(2024 - 06 - 01));
        assert!(matches!(form.export(), Err(ExportError::NotReady)));
        assert!(!form.view().download_visible);
    }

    #[tokio::test]
    async fn resubmission_discards_previous_report() {
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 01 - 31));
        form.submit(&StubApi::returning(Ok(report()))).await;
        assert!(form.view().download_visible);

        let failing =
            StubApi::returning(Err(FetchError::Transport("connection reset".to_string())));
        form.submit(&failing).await;

        assert!(!form.view().download_visible);
        assert_eq!(form.alert().map(|a| a.message.as_str()), Some("connection reset"));
    }

    #[tokio::test]
    async fn detailed_flag_is_sent_and_used_for_export() {
        let api = StubApi::returning(Ok(report()));
        let mut form = filled_form(date!(2024 - 01 - 01), date!(2024 - 01 - 31));
        form.set_detailed(true);
        form.set_granularity(Granularity::Hourly);

        form.submit(&api).await;

        match form.state() {
            SubmissionState::Success { request, .. } => {
                assert!(request.detailed);
                assert_eq!(request.granularity, Granularity::Hourly);
                assert_eq!(request.subscription_id, VALID.to_uppercase());
            }
            other => panic!("unexpected state: {other:?}"),
        }
        let file = form.export().unwrap();
        assert!(file.content.contains("instanceData.location"));
    }
}
