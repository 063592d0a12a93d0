use anyhow::{bail, Result};
use clap::Parser;
use report_client::HttpReportClient;
use utilization_report::{
    config::AppConfig,
    observability,
    pipeline::{ResourcesForm, SubmitOutcome},
};

/// List the resources of a customer subscription.
#[derive(Parser, Debug)]
#[command(name = "my-resources")]
struct Args {
    #[arg(long)]
    customer_id: String,

    #[arg(long)]
    subscription_id: String,
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

    let mut form = ResourcesForm::new();
    form.set_customer_id(&args.customer_id);
    form.set_subscription_id(&args.subscription_id);

    let outcome = form.submit(&client).await;
    let view = form.view();
    for msg in [&view.customer_id_error, &view.subscription_id_error].into_iter().flatten() {
        eprintln!("{msg}");
    }

    match outcome {
        SubmitOutcome::Succeeded { .. } => {
            if let Some(resources) = form.resources() {
                for item in &resources.items {
                    println!("{}", serde_json::to_string(item)?);
                }
            }
            Ok(())
        }
        SubmitOutcome::Rejected(_) => bail!("input validation failed"),
        SubmitOutcome::Failed(e) => bail!("resource lookup failed: {e}"),
        SubmitOutcome::Busy => bail!("a resource lookup is already in progress"),
    }
}
