use geo::Point;
use serde::{Deserialize, Serialize};

/// A point-of-interest with popularity counters (a climbing area).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: String,
    pub location: Point,
    pub num_rock_routes: u64,
    pub num_views: u64,
    #[serde(default)]
    pub name: Option<String>,
}

impl SiteRecord {
    pub fn new(id: impl Into<String>, location: Point, num_rock_routes: u64, num_views: u64) -> Self {
        Self {
            id: id.into(),
            location,
            num_rock_routes,
            num_views,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn location(&self) -> &Point {
        &self.location
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
