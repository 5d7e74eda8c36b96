//! Runtime configuration for the pandemic dashboard.
//!
//! All values come from environment variables (a `.env` file is loaded by
//! the binary before this runs) and fall back to defaults suitable for a
//! statistics service on localhost.

use anyhow::{Result, anyhow};
use chrono::Locale;
use std::env;
use std::time::Duration;

use crate::dashboard::{ComparisonPair, DashboardSettings};
use crate::format::DateFormatter;
use crate::geo::CoordinateTable;
use crate::regions::RegionCatalog;

/// Parse an optional numeric variable with a default value.
macro_rules! parse_var {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Strongly typed application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Statistics service base URL (without the `/api` suffix).
    pub api_url: String,

    /// Whole-request timeout.
    pub request_timeout: Duration,

    /// TCP connect timeout.
    pub connect_timeout: Duration,

    /// Locale used for display dates.
    pub locale: Locale,

    /// Text shown for missing or unparseable dates.
    pub unavailable_label: String,

    /// Continent shown for regions that carry none.
    pub unspecified_continent: String,

    /// Optional JSON file replacing the built-in region catalog.
    pub regions_file: Option<String>,

    /// Optional JSON file replacing the built-in coordinate table.
    pub coordinates_file: Option<String>,

    /// The two pandemics every comparison juxtaposes.
    pub comparison: ComparisonPair,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `PANDEMIC_API_URL` – service base URL (default: `http://localhost:8080`)
/// - `HTTP_TIMEOUT_SECS` – request timeout (default: 30)
/// - `HTTP_CONNECT_TIMEOUT_SECS` – connect timeout (default: 10)
/// - `DISPLAY_LOCALE` – e.g. `fr_FR` (default), `en_US`
/// - `UNAVAILABLE_LABEL` – default `unavailable`
/// - `UNSPECIFIED_CONTINENT` – default `unspecified`
/// - `REGIONS_FILE`, `COORDINATES_FILE` – JSON overrides
/// - `COMPARE_PANDEMIC_A` / `COMPARE_PANDEMIC_B` – names (default SARS / COVID)
/// - `COMPARE_PANDEMIC_A_ID` / `COMPARE_PANDEMIC_B_ID` – ids (default 1 / 2)
pub fn load_from_env() -> Result<Config> {
    Config::from_lookup(|key| env::var(key).ok())
}

impl Config {
    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // ---
        let api_url = lookup("PANDEMIC_API_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string());
        let request_timeout = parse_var!(lookup, "HTTP_TIMEOUT_SECS", u64, 30);
        let connect_timeout = parse_var!(lookup, "HTTP_CONNECT_TIMEOUT_SECS", u64, 10);

        let locale_name = lookup("DISPLAY_LOCALE").unwrap_or_else(|| "fr_FR".to_string());
        let locale = Locale::try_from(locale_name.as_str())
            .map_err(|_| anyhow!("Invalid DISPLAY_LOCALE: unknown locale '{}'", locale_name))?;

        let defaults = ComparisonPair::default();
        let comparison = ComparisonPair {
            first_name: lookup("COMPARE_PANDEMIC_A").unwrap_or(defaults.first_name),
            second_name: lookup("COMPARE_PANDEMIC_B").unwrap_or(defaults.second_name),
            first_id: parse_var!(lookup, "COMPARE_PANDEMIC_A_ID", i64, defaults.first_id),
            second_id: parse_var!(lookup, "COMPARE_PANDEMIC_B_ID", i64, defaults.second_id),
        };

        Ok(Config {
            api_url,
            request_timeout: Duration::from_secs(request_timeout),
            connect_timeout: Duration::from_secs(connect_timeout),
            locale,
            unavailable_label: lookup("UNAVAILABLE_LABEL")
                .unwrap_or_else(|| "unavailable".to_string()),
            unspecified_continent: lookup("UNSPECIFIED_CONTINENT")
                .unwrap_or_else(|| "unspecified".to_string()),
            regions_file: lookup("REGIONS_FILE").filter(|p| !p.is_empty()),
            coordinates_file: lookup("COORDINATES_FILE").filter(|p| !p.is_empty()),
            comparison,
        })
    }

    /// Resolves files and formatters into dashboard settings.
    pub fn dashboard_settings(&self) -> Result<DashboardSettings> {
        let regions = match &self.regions_file {
            Some(path) => RegionCatalog::load(path)?,
            None => RegionCatalog::builtin(),
        };
        let coordinates = match &self.coordinates_file {
            Some(path) => CoordinateTable::load(path)?,
            None => CoordinateTable::builtin(),
        };

        Ok(DashboardSettings {
            regions,
            coordinates,
            dates: DateFormatter::new(self.locale, self.unavailable_label.clone()),
            unspecified_continent: self.unspecified_continent.clone(),
            comparison: self.comparison.clone(),
        })
    }

    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  PANDEMIC_API_URL : {}", self.api_url);
        tracing::info!("  HTTP_TIMEOUT     : {:?}", self.request_timeout);
        tracing::info!("  CONNECT_TIMEOUT  : {:?}", self.connect_timeout);
        tracing::info!("  DISPLAY_LOCALE   : {:?}", self.locale);
        tracing::info!(
            "  REGIONS_FILE     : {}",
            self.regions_file.as_deref().unwrap_or("<builtin>")
        );
        tracing::info!(
            "  COORDINATES_FILE : {}",
            self.coordinates_file.as_deref().unwrap_or("<builtin>")
        );
        tracing::info!(
            "  COMPARISON       : {} (#{}) vs {} (#{})",
            self.comparison.first_name,
            self.comparison.first_id,
            self.comparison.second_name,
            self.comparison.second_id
        );
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.locale, Locale::fr_FR);
        assert_eq!(config.unavailable_label, "unavailable");
        assert_eq!(config.comparison, ComparisonPair::default());
        assert!(config.regions_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PANDEMIC_API_URL", "https://stats.example.org"),
            ("HTTP_TIMEOUT_SECS", " 5 "),
            ("DISPLAY_LOCALE", "en_US"),
            ("COMPARE_PANDEMIC_B", "H1N1"),
            ("COMPARE_PANDEMIC_B_ID", "7"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://stats.example.org");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.locale, Locale::en_US);
        assert_eq!(config.comparison.second_name, "H1N1");
        assert_eq!(config.comparison.second_id, 7);
        assert_eq!(config.comparison.first_name, "SARS");
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(Config::from_lookup(lookup_from(&[("HTTP_TIMEOUT_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DISPLAY_LOCALE", "xx_YY")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("COMPARE_PANDEMIC_A_ID", "one")])).is_err());
    }

    #[test]
    fn test_dashboard_settings_with_builtin_data() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        let settings = config.dashboard_settings().unwrap();
        assert_eq!(settings.regions.regions().len(), 12);
        assert_eq!(settings.coordinates.len(), 12);
        assert_eq!(settings.unspecified_continent, "unspecified");
    }

    #[test]
    fn test_dashboard_settings_missing_file_is_error() {
        let config = Config::from_lookup(lookup_from(&[(
            "REGIONS_FILE",
            "/definitely/not/here/regions.json",
        )]))
        .unwrap();
        assert!(config.dashboard_settings().is_err());
    }
}
