use anyhow::Result;
use compute::{default_calculator, engine::DEFAULT_CUTOFF_YEAR};
use ::config::{Config, Environment, File};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::{AppState, CachedData};

/// Default config file, looked up without extension (`finreport.toml`,
/// `finreport.yaml`, ...)
pub const DEFAULT_CONFIG_FILE: &str = "finreport";

/// Application settings, layered from defaults, an optional config file and
/// `FINREPORT__*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SeaORM connection URL
    pub database_url: String,
    /// Address the HTTP server binds to
    pub bind_address: String,
    pub calculation: CalculationConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalculationConfig {
    /// Periods of earlier years are never recalculated
    pub cutoff_year: i32,
    /// Set to false to allow recalculating every period
    pub historical_guard: bool,
    /// Refuse to serve when the chart of accounts has issues
    pub strict_validation: bool,
}

impl CalculationConfig {
    /// The cutoff the calculator should enforce, if any
    pub fn effective_cutoff(&self) -> Option<i32> {
        self.historical_guard.then_some(self.cutoff_year)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub max_capacity: u64,
    pub ttl_secs: u64,
}

impl Settings {
    /// Load settings. A missing default config file is fine, an explicitly
    /// requested one must exist.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match config_path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("database_url", "sqlite://finreport.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("calculation.cutoff_year", DEFAULT_CUTOFF_YEAR)?
            .set_default("calculation.historical_guard", true)?
            .set_default("calculation.strict_validation", false)?
            .set_default("cache.max_capacity", 1000)?
            .set_default("cache.ttl_secs", 300)?
            .add_source(file)
            .add_source(
                Environment::with_prefix("FINREPORT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Command line flags win over every other source
    pub fn override_database_url(&mut self, database_url: Option<String>) {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
    }
}

/// Build the statement cache
pub fn build_cache(config: &CacheConfig) -> Cache<String, CachedData> {
    Cache::builder()
        .max_capacity(config.max_capacity)
        .time_to_live(Duration::from_secs(config.ttl_secs))
        .build()
}

/// Initialize application state from settings
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    // Connect to database
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let calculator = default_calculator(settings.calculation.effective_cutoff());
    debug!("Calculator settings: {:?}", calculator.settings());

    Ok(AppState {
        db,
        cache: build_cache(&settings.cache),
        calculator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_config_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.calculation.cutoff_year, DEFAULT_CUTOFF_YEAR);
        assert!(settings.cache.max_capacity > 0);
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        assert!(Settings::load(Some("does-not-exist/finreport")).is_err());
    }

    #[test]
    fn test_effective_cutoff() {
        let mut calculation = CalculationConfig {
            cutoff_year: 2025,
            historical_guard: true,
            strict_validation: false,
        };
        assert_eq!(calculation.effective_cutoff(), Some(2025));
        calculation.historical_guard = false;
        assert_eq!(calculation.effective_cutoff(), None);
    }
}
