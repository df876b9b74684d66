use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tts_cli::controllers::narrate::NarrateController;
use tts_cli::domain::narration::NarrationOutcome;
use tts_cli::error::AppResult;
use tts_cli::infrastructure::audio::FfmpegMerger;
use tts_cli::infrastructure::cli::Cli;
use tts_cli::infrastructure::config::{Config, LogFormat};
use tts_cli::infrastructure::prompt::{AutoConfirm, Confirmation, StdinConfirmation};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(outcome) => {
            match outcome {
                NarrationOutcome::Empty => eprintln!("Nothing to synthesize: the input has no text."),
                NarrationOutcome::SingleShot { output } => eprintln!("Audio saved to {}", output.display()),
                NarrationOutcome::Merged { output, chunks, .. } => {
                    eprintln!("Merged {} chunks into {}", chunks, output.display())
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "Narration failed");
            eprintln!("Error: {}", e);
            ExitCode::from(&e)
        }
    }
}

async fn run(cli: Cli) -> AppResult<NarrationOutcome> {
    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    // Initialize logging
    init_logging(&config);

    config.validate()?;

    tracing::info!(input = %cli.input, "Starting tts-cli {}", env!("CARGO_PKG_VERSION"));

    // === DEPENDENCY INJECTION SETUP ===
    let confirmation: Arc<dyn Confirmation> = if config.pipeline.assume_yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirmation)
    };
    let merger = Arc::new(FfmpegMerger::new());
    let controller = NarrateController::new(Arc::new(config), merger, confirmation);

    controller.narrate(&cli.input, cli.output.as_deref()).await
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "tts_cli=info".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
