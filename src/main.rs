//! f451 Cloud demo
//!
//! Creates a throwaway Adafruit IO feed, uploads a random value, reads the
//! latest record back and prints it, then deletes the feed.
//!
//! ## Configuration
//!
//! Settings are read from a TOML file (default `settings.toml`). Any
//! recognized key (`AIO_ID`, `AIO_KEY`, `AIO_LOC_ID`, ...) set in the
//! environment overrides the file. `RUST_LOG` controls log output
//! (default: info).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::Rng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use f451_cloud::config::{self, Settings};
use f451_cloud::{Cloud, CloudError};

#[derive(Debug, Parser)]
#[command(name = "f451-cloud", about = "Demo of the f451 Labs cloud facade")]
struct Args {
    /// Path to the settings file
    #[arg(short, long, default_value = "settings.toml")]
    settings: PathBuf,

    /// Keep the demo feed instead of deleting it
    #[arg(long)]
    keep: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let file_values = match config::load_toml_map(&args.settings) {
        Ok(values) => values,
        Err(e) => {
            warn!(path = %args.settings.display(), error = %e, "Settings file not loaded");
            Default::default()
        }
    };

    let settings = match Settings::builder()
        .with_map(file_values)
        .overrides(config::env_overrides())
        .build()
    {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if !settings.has_aio_credentials() {
        error!("Missing Adafruit IO credentials");
        return ExitCode::FAILURE;
    }

    let cloud = Cloud::new(&settings);

    match run_demo(&cloud, args.keep).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Demo failed");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .init();
}

async fn run_demo(cloud: &Cloud, keep: bool) -> Result<(), CloudError> {
    let feed_name = demo_feed_name();

    println!("\n===== [Demo of f451 Labs Cloud Module] =====");
    println!("Creating new Adafruit IO feed: {}", feed_name);
    let feed = cloud.create_feed(&feed_name, true).await?;

    let data_point: i64 = rand::thread_rng().gen_range(1..=100);
    println!("Uploading random value '{}' to Adafruit IO feed: {}", data_point, feed.key);
    cloud.send_data(&feed.key, data_point).await?;

    println!("Receiving latest from Adafruit IO feed: {}", feed.key);
    let data = cloud.receive_data_raw(&feed.key).await?;
    match serde_json::to_string_pretty(&data) {
        Ok(pretty) => println!("{}", pretty),
        Err(e) => warn!(error = %e, "Could not format record"),
    }

    if keep {
        info!(feed_key = %feed.key, "Keeping demo feed");
    } else {
        cloud.delete_feed(&feed.key).await?;
    }

    println!("=============== [End of Demo] =================\n");
    Ok(())
}

/// Unique feed name for a demo run.
fn demo_feed_name() -> String {
    let stamp = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();
    format!("TEST_FEED_{}", stamp)
}
