use tracing_subscriber::{filter::Directive, EnvFilter};

pub fn init_tracing() {
    let directive = |s: &str| -> Directive {
        s.parse().unwrap_or_else(|_| "info".parse().unwrap())
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(directive("utilization_report=info"))
        .add_directive(directive("report_client=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
