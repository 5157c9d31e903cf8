mod cli;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use console::Style;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, TransportArg};
use taskpulse::{ConfigOverrides, PulseConfig, Session, classify, transport};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Watch {
            url,
            interval,
            transport,
            label,
            result_file,
        } => {
            let overrides = ConfigOverrides {
                poll_interval_ms: interval,
                transport: transport.map(TransportArg::into),
                label,
                result_file,
            };
            let succeeded = watch(&cli.config, &url, overrides).await?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Command::Classify { file } => classify_document(file.as_deref())?,
    }
    Ok(())
}

// Logs go to stderr next to the progress bar; quiet unless asked.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Tracks one task to completion. Returns whether it succeeded.
async fn watch(config_path: &Path, url: &str, overrides: ConfigOverrides) -> Result<bool> {
    let mut config = PulseConfig::load_from(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config
        .apply_overrides(overrides)
        .context("invalid command-line option")?;

    let mut session = Session::terminal(config.session(url)).context("failed to start session")?;
    let end = session.run().await;
    Ok(end.is_success())
}

fn classify_document(file: Option<&Path>) -> Result<()> {
    let body = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let doc = transport::decode(&body).context("update document is not valid JSON")?;
    let (update, decision) = classify(&doc);

    let style = if decision.is_terminal() {
        Style::new().bold()
    } else {
        Style::new().cyan()
    };
    println!("{}", style.apply_to(decision));
    println!("{}", serde_json::to_string_pretty(&update)?);
    Ok(())
}
