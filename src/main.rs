mod climate;
mod config;
pub mod sst_api;

use std::time::Duration;

use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt};

use crate::climate::SstClimate;
use crate::config::Config;
use crate::sst_api::cached_sst_client::CachedSstClient;
use crate::sst_api::sst_client::SstCloudClient;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_file("config.toml").or_else(|e| {
        println!("Config file not found. Creating example config.toml...");
        Config::save_example("config.toml")?;
        println!("Please edit config.toml with your settings and restart the application.");
        Err(e)
    })?;

    // Directory for logs
    let log_dir = &config.logging.directory;

    // One file per level
    let debug_file = rolling::daily(log_dir, &config.logging.debug_file);
    let info_file = rolling::daily(log_dir, &config.logging.info_file);
    let warn_file = rolling::daily(log_dir, &config.logging.warn_file);
    let error_file = rolling::daily(log_dir, &config.logging.error_file);

    // Build layers, filtering each level
    let debug_layer = fmt::layer()
        .with_writer(debug_file)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    let info_layer = fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::INFO);

    let warn_layer = fmt::layer()
        .with_writer(warn_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let error_layer = fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

    // Console pretty logger
    let console_layer = fmt::layer()
        .pretty()
        .with_filter(EnvFilter::new(&config.logging.console_level));

    // Compose subscriber
    tracing_subscriber::registry()
        .with(console_layer)
        .with(debug_layer)
        .with(info_layer)
        .with(warn_layer)
        .with(error_layer)
        .init();

    let client = CachedSstClient::new(SstCloudClient::new(&config.sst_cloud));
    let settle = Duration::from_secs(config.intervals.settle_seconds);
    let mut thermostat = SstClimate::new(&config.climate, settle, client);

    info!("Polling SST Cloud every {}s", config.intervals.update_seconds);
    loop {
        thermostat.update().await;
        info!(
            "{}: mode {:?}, action {:?}, preset {:?}, current {:?}, target {:?}",
            thermostat.name(),
            thermostat.hvac_mode(),
            thermostat.hvac_action(),
            thermostat.preset_mode(),
            thermostat.current_temperature(),
            thermostat.target_temperature(),
        );
        tokio::time::sleep(Duration::from_secs(config.intervals.update_seconds)).await;
    }
}
