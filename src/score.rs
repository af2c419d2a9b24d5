//! Display weight of a site derived from its popularity counters.

use crate::config::ScoreConfig;
use crate::error::{BigWallError, Result};
use bigwall_types::site::SiteRecord;

/// `weight = sqrt((num_rock_routes * route_weight + num_views) / normalizer)`
///
/// With the default constants (2000 / 2000) a site with one route and a few
/// hundred page views lands near 1.0. The weight is a relative marker size
/// for the map surface, never shown as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTransform {
    route_weight: f64,
    normalizer: f64,
}

impl ScoreTransform {
    pub const DEFAULT_ROUTE_WEIGHT: f64 = 2000.0;
    pub const DEFAULT_NORMALIZER: f64 = 2000.0;

    pub fn new(route_weight: f64, normalizer: f64) -> Result<Self> {
        if !route_weight.is_finite() || route_weight < 0.0 {
            return Err(BigWallError::Config(format!(
                "route weight must be finite and non-negative, got {}",
                route_weight
            )));
        }
        if !normalizer.is_finite() || normalizer <= 0.0 {
            return Err(BigWallError::Config(format!(
                "normalizer must be finite and positive, got {}",
                normalizer
            )));
        }
        Ok(Self {
            route_weight,
            normalizer,
        })
    }

    pub fn from_config(config: &ScoreConfig) -> Result<Self> {
        Self::new(config.route_weight, config.normalizer)
    }

    /// Activity score before normalization: `routes * route_weight + views`.
    pub fn raw_score_of(&self, num_rock_routes: u64, num_views: u64) -> f64 {
        num_rock_routes as f64 * self.route_weight + num_views as f64
    }

    pub fn raw_score(&self, site: &SiteRecord) -> f64 {
        self.raw_score_of(site.num_rock_routes, site.num_views)
    }

    /// Weight for raw counters; finite and non-negative for every input.
    pub fn weight_of(&self, num_rock_routes: u64, num_views: u64) -> f64 {
        (self.raw_score_of(num_rock_routes, num_views) / self.normalizer).sqrt()
    }

    pub fn weight(&self, site: &SiteRecord) -> f64 {
        self.weight_of(site.num_rock_routes, site.num_views)
    }
}

impl Default for ScoreTransform {
    fn default() -> Self {
        Self {
            route_weight: Self::DEFAULT_ROUTE_WEIGHT,
            normalizer: Self::DEFAULT_NORMALIZER,
        }
    }
}
