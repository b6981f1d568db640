use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use usagesnap::app;
use usagesnap::config::{Config, Settings};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings; a broken config file must not cost the output line
    let mut settings = Settings::load(cli.config.as_ref()).unwrap_or_else(|e| {
        warn!("{:#}; using defaults", e);
        Settings::default()
    });
    settings.merge_cli(&cli);
    settings.validate();

    // Best effort: always one line/object, always exit 0
    println!("{}", app::run(&cli, &settings).await);
}

fn setup_logging(debug: bool) {
    // stdout is reserved for the report
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("usagesnap=debug,usagesnap_core=debug")
        } else {
            EnvFilter::new("usagesnap=warn,usagesnap_core=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
