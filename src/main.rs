//! restockd - container registry and restock scheduler
//!
//! Headless driver: replays a command script against an in-memory world.

mod command_script;
mod headless;

use anyhow::Result;
use std::{env, path::PathBuf};
use tracing::info;

const DEFAULT_DATA_DIR: &str = "restock-data";

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting restockd v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    if cli.help {
        print_usage();
        return Ok(());
    }

    let summary = headless::run(headless::HeadlessConfig {
        data_dir: cli.data_dir,
        script: cli.script,
        max_ticks: cli.max_ticks,
        event_log: cli.event_log,
    })?;
    for line in &summary.transcript {
        println!("{line}");
    }
    Ok(())
}

fn print_usage() {
    println!(
        "Usage: restockd [--data-dir <path>] [--script <path>] \
         [--ticks <n>] [--event-log <path>]"
    );
}

#[derive(Debug)]
struct CliOptions {
    help: bool,
    data_dir: PathBuf,
    script: Option<PathBuf>,
    max_ticks: Option<u64>,
    event_log: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions {
            help: false,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            script: None,
            max_ticks: None,
            event_log: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => opts.help = true,
                "--data-dir" => {
                    if let Some(path) = args.next() {
                        opts.data_dir = PathBuf::from(path);
                    } else {
                        tracing::error!("--data-dir requires a directory path");
                    }
                }
                "--script" => {
                    if let Some(path) = args.next() {
                        opts.script = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--script requires a file path");
                    }
                }
                "--ticks" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.max_ticks = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--ticks must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--ticks requires an integer");
                    }
                }
                "--event-log" => {
                    if let Some(path) = args.next() {
                        opts.event_log = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--event-log requires a file path");
                    }
                }
                other => {
                    tracing::warn!(arg = %other, "Ignoring unknown argument");
                }
            }
        }

        opts
    }
}
