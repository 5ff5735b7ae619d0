//! Command-line entry point for tracker-dl.
//!
//! Credentials are read from `TRACKER_USERNAME` / `TRACKER_PASSWORD`
//! (a `.env` file next to the binary works); everything else comes from the
//! positional arguments.

use std::process::ExitCode;
use tracing::{error, info};
use tracker_dl::{auth, Config, Result, RunSummary, Tracker};

const USAGE: &str = "usage: tracker-dl <store_path> <feed_source> <output_dir> [<blacklist_path>]";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 || args.len() > 4 {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    let mut config = Config {
        store_path: args[0].clone().into(),
        feed_source: args[1].clone(),
        output_dir: args[2].clone().into(),
        blacklist_path: args.get(3).map(|path| path.clone().into()),
        ..Config::default()
    };
    config.tracker.username = std::env::var("TRACKER_USERNAME").ok();
    config.tracker.password = std::env::var("TRACKER_PASSWORD").ok();

    match run(config).await {
        Ok(summary) => {
            info!(%summary, "run finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<RunSummary> {
    let client = auth::login(&config.tracker).await?;
    let tracker = Tracker::new(config, client).await?;
    tracker.run().await
}
