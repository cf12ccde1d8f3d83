use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use homework_bot::config::{AppConfig, LogFormat};
use homework_bot::platform::practicum::PracticumClient;
use homework_bot::platform::telegram::TelegramSender;
use homework_bot::poller::Poller;
use homework_bot::shutdown::wait_for_shutdown;

#[derive(Parser)]
#[command(name = "homework-bot", about = "Relays homework review status changes to Telegram")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Run a single polling cycle and exit
    #[arg(long)]
    once: bool,
}

fn init_tracing(format: LogFormat) {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dotenv_path = dotenvy::dotenv().ok();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            return Err(e.into());
        }
    };

    init_tracing(config.logging.format);

    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "Loaded environment from file");
    }

    let source = PracticumClient::new(&config.practicum)?;
    let sender = TelegramSender::new(&config.telegram);

    tracing::info!(
        endpoint = %source.endpoint(),
        chat_id = config.telegram.chat_id,
        interval_secs = config.poller.interval_secs,
        "Starting homework bot"
    );

    let mut poller = Poller::new(source, sender, &config.poller);

    if cli.once {
        let outcome = poller.poll_once().await;
        tracing::info!(outcome = ?outcome, "Single cycle complete");
        if outcome.is_failure() {
            anyhow::bail!("polling cycle failed: {outcome:?}");
        }
        return Ok(());
    }

    poller.run(wait_for_shutdown()).await;

    Ok(())
}
