//! Runtime configuration, loaded from an optional TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::osm::NetworkMode;
use crate::{Error, Result};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory receiving the report and map files.
    pub output_dir: PathBuf,
    /// Plot every Nth intersection on the map.
    pub map_stride: usize,
    /// Street types kept in the statistics record.
    pub report_top_n: usize,
    /// Street types printed in the console summary.
    pub display_top_n: usize,
    pub network_mode: NetworkMode,
    pub source: DataSource,
    pub cities: Vec<CityConfig>,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Overpass { url: String, timeout_secs: u64 },
    /// Local extracts, one `.osm.pbf` per city (see [`CityConfig::pbf`]).
    Pbf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbf: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let cities = [
            "Cali, Colombia",
            "Bogotá, Colombia",
            "Medellín, Colombia",
            "Barranquilla, Colombia",
            "Cartagena, Colombia",
        ]
        .into_iter()
        .map(|name| CityConfig {
            name: name.to_string(),
            pbf: None,
        })
        .collect();

        Self {
            output_dir: PathBuf::from("."),
            map_stride: 100,
            report_top_n: 10,
            display_top_n: 5,
            network_mode: NetworkMode::Drive,
            source: DataSource::default(),
            cities,
            server: ServerConfig::default(),
        }
    }
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Overpass {
            url: DEFAULT_OVERPASS_URL.to_string(),
            timeout_secs: 180,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                let raw = std::fs::read_to_string(path)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.map_stride == 0 {
            return Err(Error::Config("map_stride must be at least 1".to_string()));
        }
        if self.report_top_n == 0 || self.display_top_n == 0 {
            return Err(Error::Config(
                "report_top_n and display_top_n must be at least 1".to_string(),
            ));
        }
        if self.cities.is_empty() {
            return Err(Error::Config("No cities configured".to_string()));
        }
        if self.source == DataSource::Pbf {
            if let Some(city) = self.cities.iter().find(|c| c.pbf.is_none()) {
                return Err(Error::Config(format!(
                    "City '{}' has no pbf extract but the source is 'pbf'",
                    city.name
                )));
            }
        }
        Ok(())
    }

    pub fn city_names(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cities.len(), 5);
        assert_eq!(config.map_stride, 100);
        assert_eq!(config.report_top_n, 10);
        assert_eq!(config.display_top_n, 5);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            output_dir = "out"
            map_stride = 25

            [[cities]]
            name = "Quito, Ecuador"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.map_stride, 25);
        assert_eq!(config.report_top_n, 10);
        assert_eq!(config.city_names().collect::<Vec<_>>(), ["Quito, Ecuador"]);
        assert_eq!(config.source, DataSource::default());
    }

    #[test]
    fn pbf_source_requires_extracts() {
        let config = AppConfig::from_toml(
            r#"
            [source]
            kind = "pbf"

            [[cities]]
            name = "Cali, Colombia"
            pbf = "extracts/cali.osm.pbf"

            [[cities]]
            name = "Bogotá, Colombia"
            "#,
        )
        .unwrap();

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_stride_is_rejected() {
        let config = AppConfig {
            map_stride: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_network_mode_fails_to_parse() {
        assert!(AppConfig::from_toml("network_mode = \"flying\"").is_err());
    }
}
