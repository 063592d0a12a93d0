use anyhow::{bail, Result};
use clap::Parser;
use report_client::{Granularity, HttpReportClient};
use time::{macros::format_description, Date};
use utilization_report::{
    config::AppConfig,
    observability,
    pipeline::{report_form::one_month_before, ReportForm, SubmitOutcome, ViewState},
    sinks::FileDownloadSink,
};

fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Generate a customer utilization report and save it as CSV.
#[derive(Parser, Debug)]
#[command(name = "utilization-report")]
struct Args {
    #[arg(long)]
    customer_id: String,

    #[arg(long)]
    subscription_id: String,

    /// Defaults to one month before the end date.
    #[arg(long, value_parser = parse_date)]
    start: Option<Date>,

    /// Defaults to today.
    #[arg(long, value_parser = parse_date)]
    end: Option<Date>,

    #[arg(long, default_value = "daily")]
    granularity: Granularity,

    /// Include every measure column.
    #[arg(long)]
    detailed: bool,
}

fn report_view(view: &ViewState) {
    if let Some(msg) = &view.customer_id_error {
        eprintln!("customer id: {msg}");
    }
    if let Some(msg) = &view.subscription_id_error {
        eprintln!("subscription id: {msg}");
    }
    if let Some(alert) = &view.alert {
        eprintln!("[{:?}] {}: {}", alert.severity, alert.title, alert.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args = Args::parse();
    let cfg = AppConfig::load()?;

    let mut client = HttpReportClient::new(&cfg.api.base_url);
    if let Some(token) = &cfg.api.auth_bearer_token {
        client = client.with_bearer_token(token);
    }

    let mut form = ReportForm::for_today().with_exporter(cfg.export.exporter());
    form.set_customer_id(&args.customer_id);
    form.set_subscription_id(&args.subscription_id);
    if let Some(end) = args.end {
        form.set_end_date(end);
        if args.start.is_none() {
            form.set_start_date(one_month_before(end));
        }
    }
    if let Some(start) = args.start {
        form.set_start_date(start);
    }
    form.set_granularity(args.granularity);
    form.set_detailed(args.detailed);

    let outcome = form.submit(&client).await;
    report_view(&form.view());

    match outcome {
        SubmitOutcome::Succeeded { items } => {
            let sink = FileDownloadSink::new(&cfg.export.output_dir);
            let file = form.export_to(&sink)?;
            println!("{}", sink.path_for(&file).display());
            tracing::info!(items, filename = %file.filename, "report exported");
            Ok(())
        }
        SubmitOutcome::Rejected(_) => bail!("input validation failed"),
        SubmitOutcome::Failed(e) => bail!("report request failed: {e}"),
        SubmitOutcome::Busy => bail!("a report request is already in progress"),
    }
}
