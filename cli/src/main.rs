use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::ProgressBar;
use ohlc_fetcher::{
    client::Client,
    config::Config,
    credentials::Credentials,
    service::{style, FailurePolicy, Service},
};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "ohlc-fetcher.log";

/// CLI tool to download yearly kline data from Binance into CSV files
#[derive(Parser, Debug)]
struct Args {
    /// JSON file listing the symbols, years, interval, columns and output
    /// folder to use. Absent fields fall back to their defaults.
    #[clap(short, long, default_value = "config.json")]
    config: PathBuf,
    /// Log failed (symbol, year) pairs and keep going instead of stopping
    /// at the first error. The exit status is still non-zero if any failed.
    #[clap(short, long)]
    keep_going: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();
    let credentials = Credentials::from_env()
        .context("BINANCE_API_KEY and BINANCE_API_SECRET must be set in the environment or .env")?;
    let config = Config::load(&args.config)?;

    let file_appender = log_appender(&config.save_path)?;
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .with(EnvFilter::from_default_env())
        .init();

    let client = Client::new(&credentials)?;
    let service = Service::new(client, config);
    let policy = if args.keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };
    let progress_bar =
        ProgressBar::new(service.num_pairs() as u64).with_style(style());
    let summary = service.export_all(policy, &progress_bar).await?;

    if !summary.failures.is_empty() {
        for failure in &summary.failures {
            eprintln!(
                "failed to export {} for {}: {}",
                failure.symbol, failure.year, failure.error
            );
        }
        bail!(
            "{} of {} exports failed",
            summary.failures.len(),
            service.num_pairs()
        );
    }
    Ok(())
}

/// Daily rolling log file in `dir`, which is created if missing.
fn log_appender(dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::log_appender;

    #[test]
    fn log_appender_creates_missing_directory() {
        let dir = env::temp_dir()
            .join(format!("ohlc_cli_logs_{}", std::process::id()))
            .join("nested");
        let _ = fs::remove_dir_all(&dir);
        assert!(log_appender(&dir).is_ok());
        assert!(dir.is_dir());
        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn log_appender_reports_uncreatable_directory() {
        let base = env::temp_dir()
            .join(format!("ohlc_cli_blocked_{}", std::process::id()));
        fs::create_dir_all(&base).unwrap();
        let blocker = base.join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let err = log_appender(&blocker.join("sub")).unwrap_err();
        assert!(err.to_string().starts_with("failed to create log directory"));
        let _ = fs::remove_dir_all(&base);
    }
}
