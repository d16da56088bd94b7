use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub sst_cloud: SstCloudConfig,
    pub climate: ClimateConfig,
    pub intervals: IntervalConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub directory: String,
    pub debug_file: String,
    pub info_file: String,
    pub warn_file: String,
    pub error_file: String,
    pub console_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SstCloudConfig {
    pub username: String,
    pub password: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClimateConfig {
    pub name: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub boost_temp: f64,
    pub sleep_temp: f64,
    /// Device id or device name. May be omitted when the account has exactly
    /// one device.
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IntervalConfig {
    pub update_seconds: u64,
    pub settle_seconds: u64,
}

fn default_language() -> String {
    "ru".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_example(path: &str) -> Result<()> {
        let example_config = Config {
            logging: LoggingConfig {
                directory: "./logs".to_string(),
                debug_file: "log_debug.log".to_string(),
                info_file: "log_info.log".to_string(),
                warn_file: "log_warn.log".to_string(),
                error_file: "log_error.log".to_string(),
                console_level: "info".to_string(),
            },
            sst_cloud: SstCloudConfig {
                username: "REPLACE_WITH_YOUR_SST_CLOUD_EMAIL".to_string(),
                password: "REPLACE_WITH_YOUR_SST_CLOUD_PASSWORD".to_string(),
                language: default_language(),
            },
            climate: ClimateConfig {
                name: "Floor heating".to_string(),
                min_temp: 5.0,
                max_temp: 45.0,
                boost_temp: 40.0,
                sleep_temp: 18.0,
                device: None,
            },
            intervals: IntervalConfig {
                update_seconds: 60,
                settle_seconds: 10,
            },
        };

        let toml_content = toml::to_string_pretty(&example_config)?;
        fs::write(path, toml_content)?;
        Ok(())
    }
}
