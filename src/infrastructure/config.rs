use crate::application::aggregation_service::AggregationSettings;
use crate::application::station_locator::MAX_RADIUS_METERS;
use crate::domain::units::{ConversionFactors, DEFAULT_PPB_FACTOR, DEFAULT_PPM_FACTOR};
use anyhow::ensure;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub openaq: OpenAqSettings,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub persistence: PersistenceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAqSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    /// Per-call HTTP timeout. The aggregation deadline still applies on top.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregationConfig {
    #[serde(default = "default_radius_meters")]
    pub radius_meters: u32,
    #[serde(default = "default_max_stations")]
    pub max_stations: usize,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            radius_meters: default_radius_meters(),
            max_stations: default_max_stations(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

/// ppm/ppb to µg/m³ factors. The defaults assume 25 °C and 1 atm.
#[derive(Debug, Deserialize, Clone)]
pub struct ConversionConfig {
    #[serde(default = "default_ppm_factor")]
    pub ppm_factor: f64,
    #[serde(default = "default_ppb_factor")]
    pub ppb_factor: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ppm_factor: default_ppm_factor(),
            ppb_factor: default_ppb_factor(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PersistenceSettings {
    /// Append each result to this CSV file when set
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_base_url() -> String {
    "https://api.openaq.org/v3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_radius_meters() -> u32 {
    5000
}

fn default_max_stations() -> usize {
    5
}

fn default_deadline_secs() -> u64 {
    20
}

fn default_ppm_factor() -> f64 {
    DEFAULT_PPM_FACTOR
}

fn default_ppb_factor() -> f64 {
    DEFAULT_PPB_FACTOR
}

impl AppConfig {
    pub fn aggregation_settings(&self) -> AggregationSettings {
        AggregationSettings {
            radius_meters: self.aggregation.radius_meters,
            max_stations: self.aggregation.max_stations,
            deadline: Duration::from_secs(self.aggregation.deadline_secs),
            conversion: ConversionFactors {
                ppm_factor: self.conversion.ppm_factor,
                ppb_factor: self.conversion.ppb_factor,
            },
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.openaq.api_key.trim().is_empty(),
            "openaq.api_key is required (set AIRQ_OPENAQ__API_KEY or OPENAQ_API_KEY)"
        );
        ensure!(
            (1..=MAX_RADIUS_METERS).contains(&self.aggregation.radius_meters),
            "aggregation.radius_meters must be between 1 and {}",
            MAX_RADIUS_METERS
        );
        ensure!(self.aggregation.max_stations > 0, "aggregation.max_stations must be positive");
        ensure!(self.aggregation.deadline_secs > 0, "aggregation.deadline_secs must be positive");
        ensure!(
            self.conversion.ppm_factor > 0.0 && self.conversion.ppb_factor > 0.0,
            "conversion factors must be positive"
        );
        Ok(())
    }
}

/// Load `config/airq.toml`, then `AIRQ_*` environment overrides (e.g. `AIRQ_OPENAQ__API_KEY`).
/// A bare `OPENAQ_API_KEY` takes precedence over both.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config/airq").required(false))
        .add_source(
            config::Environment::with_prefix("AIRQ")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("openaq.api_key", std::env::var("OPENAQ_API_KEY").ok())?;

    build_app_config(builder)
}

fn build_app_config(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> anyhow::Result<AppConfig> {
    let settings = builder.build()?;
    let app_config: AppConfig = settings.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}
