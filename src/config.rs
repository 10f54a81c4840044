use crate::error::{Result, WeatherlyError};
use crate::models::GeoLocation;
use dialoguer::{Input, Password, Select};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "WEATHERLY";

#[derive(Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub units: Units,
    #[serde(default = "default_city")]
    pub default_city: DefaultCity,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("units", &self.units)
            .field("default_city", &self.default_city)
            .field("endpoints", &self.endpoints)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("shutdown_grace_ms", &self.shutdown_grace_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    /// Value of the OpenWeatherMap `units` query parameter
    pub fn as_query(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Some(Units::Metric),
            "imperial" | "f" | "fahrenheit" => Some(Units::Imperial),
            _ => None,
        }
    }
}

/// City shown when IP geolocation fails
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultCity {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl DefaultCity {
    pub fn to_location(&self) -> GeoLocation {
        GeoLocation::new(self.name.clone(), self.latitude, self.longitude)
    }
}

fn default_city() -> DefaultCity {
    DefaultCity {
        name: "Madrid".into(),
        latitude: 40.4168,
        longitude: -3.7038,
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Endpoints {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_geo_base")]
    pub geo_base: String,
    #[serde(default = "default_ip_base")]
    pub ip_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            geo_base: default_geo_base(),
            ip_base: default_ip_base(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openweathermap.org".into()
}

fn default_geo_base() -> String {
    "http://api.openweathermap.org".into()
}

fn default_ip_base() -> String {
    "http://ip-api.com".into()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}

impl Config {
    /// Layer defaults, the YAML file and the environment, then require an
    /// API key.
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(WeatherlyError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                Some(p.clone())
            }
            None => Self::find_config_path(),
        };

        let file_contents = match &config_path {
            Some(path) => Some(Self::read_with_env(path)?),
            None => None,
        };

        let config = Self::from_sources(file_contents.as_deref())?;
        config.validate()?;

        tracing::debug!(?config_path, units = ?config.units, "Configuration loaded");
        Ok(config)
    }

    fn read_with_env(path: &Path) -> Result<String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| WeatherlyError::Config(format!("Failed to read config: {}", e)))?;
        Ok(Self::substitute_env_vars(&raw))
    }

    /// Build from an optional YAML document plus `WEATHERLY_*` variables and
    /// the bare `API_KEY` / `UNITS` variables.
    fn from_sources(yaml: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(yaml) = yaml {
            builder = builder.add_source(config::File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let mut config: Config = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| WeatherlyError::Config(format!("Failed to parse config: {}", e)))?;

        if config.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var("API_KEY") {
                config.api_key = key;
            }
        }
        if std::env::var(format!("{}_UNITS", ENV_PREFIX)).is_err() {
            if let Some(units) = std::env::var("UNITS").ok().and_then(|u| Units::from_str(&u)) {
                config.units = units;
            }
        }

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(WeatherlyError::MissingCredential);
        }
        if self.request_timeout_secs == 0 {
            return Err(WeatherlyError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// First existing config.yaml in the standard locations.
    fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("weatherly").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Default path for writing new config files (~/.config/weatherly/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| WeatherlyError::Config("Cannot determine config directory".into()))?
            .join("weatherly");
        Ok(config_dir.join("config.yaml"))
    }

    /// Directory for the TUI log file (~/.local/share/weatherly).
    pub fn data_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("WEATHERLY_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| WeatherlyError::Config("Cannot determine data directory".into()))?
            .join("weatherly");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up Weatherly!");
        println!();

        println!("OpenWeatherMap");
        let api_key: String = Password::new()
            .with_prompt("  API key")
            .interact()
            .map_err(|e| WeatherlyError::Config(format!("Input error: {}", e)))?;

        let unit_options = ["metric (°C)", "imperial (°F)"];
        let unit_index = Select::new()
            .with_prompt("  Units")
            .items(&unit_options)
            .default(0)
            .interact()
            .map_err(|e| WeatherlyError::Config(format!("Input error: {}", e)))?;
        let units = if unit_index == 1 {
            Units::Imperial
        } else {
            Units::Metric
        };

        println!();
        println!("Fallback city (used when IP location fails)");
        let fallback = default_city();
        let city_name: String = Input::new()
            .with_prompt("  City")
            .default(fallback.name)
            .interact_text()
            .map_err(|e| WeatherlyError::Config(format!("Input error: {}", e)))?;

        let latitude: f64 = Input::new()
            .with_prompt("  Latitude")
            .default(fallback.latitude)
            .interact_text()
            .map_err(|e| WeatherlyError::Config(format!("Input error: {}", e)))?;

        let longitude: f64 = Input::new()
            .with_prompt("  Longitude")
            .default(fallback.longitude)
            .interact_text()
            .map_err(|e| WeatherlyError::Config(format!("Input error: {}", e)))?;

        let config = Config {
            api_key,
            units,
            default_city: DefaultCity {
                name: city_name,
                latitude,
                longitude,
            },
            ..Config::default()
        };
        config.validate()?;

        let config_path = Self::default_config_path()?;
        config.write_to(&config_path)?;

        println!();
        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| WeatherlyError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# Weatherly Configuration\n# Generated by `weatherly init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return content.to_string(),
        };

        re.replace_all(content, |caps: &regex_lite::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            units: Units::default(),
            default_city: default_city(),
            endpoints: Endpoints::default(),
            request_timeout_secs: default_request_timeout_secs(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    // Process environment is shared across test threads
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const LAYERED_VARS: &[&str] = &[
        "WEATHERLY_API_KEY",
        "WEATHERLY_UNITS",
        "WEATHERLY_DEFAULT_CITY__NAME",
        "API_KEY",
        "UNITS",
    ];

    /// Clears the layered variables, applies `vars`, and puts the previous
    /// values back on drop.
    struct ScopedEnv {
        saved: Vec<(&'static str, Option<String>)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl ScopedEnv {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            let saved = LAYERED_VARS
                .iter()
                .map(|k| (*k, std::env::var(k).ok()))
                .collect();
            for k in LAYERED_VARS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
            Self { saved, _lock: lock }
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for (k, v) in &self.saved {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    const FILE_YAML: &str = r#"
api_key: "file-key"
units: metric
default_city:
  name: Lisbon
  latitude: 38.72
  longitude: -9.14
"#;

    #[test]
    fn prefixed_env_overrides_file() {
        let _env = ScopedEnv::set(&[
            ("WEATHERLY_API_KEY", "env-key"),
            ("WEATHERLY_UNITS", "imperial"),
            ("WEATHERLY_DEFAULT_CITY__NAME", "Oslo"),
        ]);

        let config = Config::from_sources(Some(FILE_YAML)).unwrap();
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.default_city.name, "Oslo");
        assert_eq!(config.default_city.latitude, 38.72);
    }

    #[test]
    fn bare_api_key_fills_missing_key() {
        let _env = ScopedEnv::set(&[("API_KEY", "legacy-key")]);
        let config = Config::from_sources(None).unwrap();
        assert_eq!(config.api_key, "legacy-key");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bare_api_key_never_replaces_a_configured_one() {
        let _env = ScopedEnv::set(&[("API_KEY", "legacy-key")]);
        let config = Config::from_sources(Some(FILE_YAML)).unwrap();
        assert_eq!(config.api_key, "file-key");

        drop(_env);
        let _env = ScopedEnv::set(&[
            ("API_KEY", "legacy-key"),
            ("WEATHERLY_API_KEY", "env-key"),
        ]);
        let config = Config::from_sources(None).unwrap();
        assert_eq!(config.api_key, "env-key");
    }

    #[test]
    fn bare_units_override_file_but_yield_to_prefixed() {
        let _env = ScopedEnv::set(&[("UNITS", "imperial")]);
        let config = Config::from_sources(Some(FILE_YAML)).unwrap();
        assert_eq!(config.units, Units::Imperial);

        drop(_env);
        let _env = ScopedEnv::set(&[("UNITS", "imperial"), ("WEATHERLY_UNITS", "metric")]);
        let config = Config::from_sources(Some(FILE_YAML)).unwrap();
        assert_eq!(config.units, Units::Metric);
    }

    #[test]
    fn unparseable_bare_units_are_ignored() {
        let _env = ScopedEnv::set(&[("UNITS", "kelvin")]);
        let config = Config::from_sources(Some(FILE_YAML)).unwrap();
        assert_eq!(config.units, Units::Metric);
    }

    #[test]
    fn yaml_fields_override_defaults() {
        let _env = ScopedEnv::set(&[]);
        let yaml = r#"
api_key: "abc123"
units: imperial
default_city:
  name: Lisbon
  latitude: 38.72
  longitude: -9.14
endpoints:
  api_base: "http://localhost:9000"
"#;
        let config = Config::from_sources(Some(yaml)).unwrap();
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.units, Units::Imperial);
        assert_eq!(config.default_city.name, "Lisbon");
        assert_eq!(config.endpoints.api_base, "http://localhost:9000");
        assert_eq!(config.endpoints.ip_base, "http://ip-api.com");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.shutdown_grace(), Duration::from_millis(2000));
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(WeatherlyError::MissingCredential)
        ));

        let config = Config {
            api_key: "   ".into(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WeatherlyError::MissingCredential)
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            api_key: "k".into(),
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(WeatherlyError::Config(_))));
    }

    #[test]
    fn env_placeholders_are_substituted() {
        // PATH is always set; unknown names are left alone
        let path = std::env::var("PATH").unwrap();
        let out = Config::substitute_env_vars("a: ${PATH}\nb: ${WEATHERLY_SURELY_UNSET_VAR}");
        assert_eq!(
            out,
            format!("a: {}\nb: ${{WEATHERLY_SURELY_UNSET_VAR}}", path)
        );
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = Config {
            api_key: "super-secret".into(),
            ..Config::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn units_parse_and_describe() {
        assert_eq!(Units::from_str("Imperial"), Some(Units::Imperial));
        assert_eq!(Units::from_str("c"), Some(Units::Metric));
        assert_eq!(Units::from_str("kelvin"), None);
        assert_eq!(Units::Metric.as_query(), "metric");
        assert_eq!(Units::Imperial.temperature_suffix(), "°F");
    }

    #[test]
    fn written_config_round_trips_through_loader() {
        let _env = ScopedEnv::set(&[]);
        let dir = std::env::temp_dir().join(format!("weatherly-test-{}", std::process::id()));
        let path = dir.join("config.yaml");
        let config = Config {
            api_key: "written-key".into(),
            units: Units::Imperial,
            ..Config::default()
        };
        config.write_to(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.units, Units::Imperial);
        assert_eq!(loaded.api_key, "written-key");

        std::fs::remove_dir_all(&dir).ok();
    }
}
