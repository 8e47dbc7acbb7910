use anyhow::Result;
use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yt_trim::{output, Cli, ClipError, ClipPipeline, ClipRequest, Config, LogFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            let code = err
                .downcast_ref::<ClipError>()
                .map(ClipError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "yt_trim=debug"
    } else if cli.quiet {
        "yt_trim=warn"
    } else {
        "yt_trim=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_cli(&cli)?;
    if let Ok(json) = serde_json::to_string(&config) {
        tracing::debug!(config = %json, "Loaded configuration");
    }

    let request = ClipRequest {
        url: cli.url,
        start: cli.start,
        end: cli.end,
        output: cli.output,
        keep_temp: cli.keep_temp,
    };

    let pipeline = ClipPipeline::new(config);
    let outcome = pipeline.run(&request).await?;

    output::print_summary(&outcome);
    Ok(())
}
