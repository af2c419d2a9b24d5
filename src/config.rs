//! Engine configuration.
//!
//! `Config` is plain serde data so a host application can keep it in JSON
//! (or TOML with the `toml` feature) next to its feature snapshots.
use crate::error::{BigWallError, Result};
use serde::de::Error;

/// Constants of the site weight transform `sqrt((routes * route_weight + views) / normalizer)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreConfig {
    #[serde(default = "ScoreConfig::default_route_weight")]
    pub route_weight: f64,

    #[serde(default = "ScoreConfig::default_normalizer")]
    pub normalizer: f64,
}

impl ScoreConfig {
    const fn default_route_weight() -> f64 {
        2000.0
    }

    const fn default_normalizer() -> f64 {
        2000.0
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            route_weight: Self::default_route_weight(),
            normalizer: Self::default_normalizer(),
        }
    }
}

/// Query engine configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Radius of the disk drawn around each map click
    #[serde(default = "Config::default_query_radius")]
    pub query_radius_meters: f64,

    #[serde(default)]
    pub score: ScoreConfig,

    /// Height palette as hex colors; `None` selects the built-in 40-band palette
    #[serde(default)]
    pub palette: Option<Vec<String>>,

    /// Maximum distance for associating a site with its closest formation
    #[serde(default = "Config::default_nearest_threshold")]
    pub nearest_threshold_meters: f64,

    /// Radius used when summarizing site activity around a formation
    #[serde(default = "Config::default_vicinity_radius")]
    pub vicinity_radius_meters: f64,
}

impl Config {
    const fn default_query_radius() -> f64 {
        1000.0
    }

    const fn default_nearest_threshold() -> f64 {
        300.0
    }

    const fn default_vicinity_radius() -> f64 {
        800.0
    }

    pub fn with_query_radius(mut self, radius_meters: f64) -> Self {
        self.query_radius_meters = radius_meters;
        self
    }

    pub fn with_score(mut self, score: ScoreConfig) -> Self {
        self.score = score;
        self
    }

    pub fn with_palette(mut self, colors: Vec<String>) -> Self {
        self.palette = Some(colors);
        self
    }

    pub fn with_nearest_threshold(mut self, meters: f64) -> Self {
        self.nearest_threshold_meters = meters;
        self
    }

    pub fn with_vicinity_radius(mut self, meters: f64) -> Self {
        self.vicinity_radius_meters = meters;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let positive = [
            ("query_radius_meters", self.query_radius_meters),
            ("nearest_threshold_meters", self.nearest_threshold_meters),
            ("vicinity_radius_meters", self.vicinity_radius_meters),
            ("score.normalizer", self.score.normalizer),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be finite and positive, got {}", name, value));
            }
        }

        if !self.score.route_weight.is_finite() || self.score.route_weight < 0.0 {
            return Err(format!(
                "score.route_weight must be finite and non-negative, got {}",
                self.score.route_weight
            ));
        }

        if let Some(colors) = &self.palette
            && colors.is_empty()
        {
            return Err("palette must contain at least one color".to_string());
        }

        if self.query_radius_meters > 100_000.0 {
            log::warn!(
                "Query radius of {} m is very large; range queries will touch most of the index",
                self.query_radius_meters
            );
        }

        Ok(())
    }

    /// Validate and convert into the crate error type.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(BigWallError::Config)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query_radius_meters: Self::default_query_radius(),
            score: ScoreConfig::default(),
            palette: None,
            nearest_threshold_meters: Self::default_nearest_threshold(),
            vicinity_radius_meters: Self::default_vicinity_radius(),
        }
    }
}
