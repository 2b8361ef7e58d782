//! Host-supplied configuration.
//!
//! The library never reads a file or an environment variable itself —
//! that belongs to the CLI front end (`main.rs`) — it only ever consumes an
//! already-built `Config` value, passed explicitly into each compiler
//! instance. No global state.

use serde::{Deserialize, Serialize};

/// Which geocoder backend resolves `gps=town+km` style criteria.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geocoder {
    BanFrance,
    Nominatim,
    None,
}

impl Default for Geocoder {
    fn default() -> Self {
        Geocoder::None
    }
}

/// Everything the host can configure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub default_catalog_path: String,
    #[serde(default)]
    pub day_first_dates: bool,
    #[serde(default)]
    pub geocoder: Geocoder,
}

impl Config {
    pub fn new(default_catalog_path: impl Into<String>) -> Self {
        Config {
            default_catalog_path: default_catalog_path.into(),
            day_first_dates: false,
            geocoder: Geocoder::None,
        }
    }

    /// Parse a YAML configuration document. File I/O is left to the caller.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_day_first_to_false_and_geocoder_to_none() {
        let cfg = Config::new("catalog.lrcat");
        assert!(!cfg.day_first_dates);
        assert_eq!(cfg.geocoder, Geocoder::None);
    }

    #[test]
    fn parses_yaml_document() {
        let yaml = "default_catalog_path: /home/me/Lightroom.lrcat\nday_first_dates: true\ngeocoder: nominatim\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.default_catalog_path, "/home/me/Lightroom.lrcat");
        assert!(cfg.day_first_dates);
        assert_eq!(cfg.geocoder, Geocoder::Nominatim);
    }
}
