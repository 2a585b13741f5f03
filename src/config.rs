//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the coops-config.toml file.
//! It provides a centralized way to configure the data service endpoint, the HTTP
//! timeout and the default units and time zone applied to new requests.
//!
//! ```toml
//! [service]
//! base_url = "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter"
//! application = "coops_fetch"
//! timeout_secs = 60
//!
//! [defaults]
//! units = "english"
//! time_zone = "lst_ldt"
//! ```
//!
//! Every key is optional; missing keys take their default value.

use crate::product::Product;
use crate::query::{DEFAULT_APPLICATION, DEFAULT_BASE_URL};
use crate::request::{Request, TimeZone, Units};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "coops-config.toml";

/// Application configuration loaded from coops-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Data service endpoint and HTTP settings
    pub service: ServiceConfig,
    /// Defaults applied to requests created through [`Config::request`]
    pub defaults: RequestDefaults,
}

/// CO-OPS data service configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `datagetter` endpoint URL
    pub base_url: String,
    /// Value of the `application` query parameter
    pub application: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Request defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub units: Units,
    pub time_zone: TimeZone,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            application: DEFAULT_APPLICATION.to_string(),
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from coops-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), endpoint = %config.service.base_url, "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Start a request carrying the configured units and time zone.
    pub fn request(
        &self,
        begin_date: impl Into<String>,
        end_date: impl Into<String>,
        station: impl Into<String>,
        product: Product,
    ) -> Request {
        Request::new(begin_date, end_date, station, product)
            .units(self.defaults.units)
            .time_zone(self.defaults.time_zone)
    }
}
