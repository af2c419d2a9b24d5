//! Spatial aggregation over climbing sites and cliff formations.
//!
//! Two read-only feature sets are indexed once: climbing sites (points with
//! route and page-view counters) and cliff formations (points or polygons with
//! a height). A query is a disk on the earth's surface; the crate returns the
//! features inside it together with sums, maxima, a display weight per site and
//! a color band per formation.
//!
//! - **Range queries**: R*-tree pruning followed by exact haversine filtering
//! - **Aggregation**: sums, maxima and sort-then-first with explicit "no data"
//! - **Styling**: square-root site weights and 40 m height bands
//! - **Sessions**: generation-gated queries where only the latest result is kept
//!
//! ```rust
//! use bigwall::prelude::*;
//!
//! let sites = FeatureCollection::new(vec![
//!     SiteRecord::new("arch", Point::new(-119.64, 37.73), 3, 100).with_name("Arch Rock"),
//! ]);
//! let formations = FeatureCollection::new(vec![
//!     FormationRecord::new("slab", Point::new(-119.641, 37.731), 120.0),
//! ]);
//! let store = FeatureStore::load(sites, formations)?;
//!
//! let session = QuerySession::new(std::sync::Arc::new(store));
//! let summary = session.query(Point::new(-119.64, 37.73))?.expect("latest query");
//! assert_eq!(summary.rock_route_sum, 3);
//! assert_eq!(summary.most_viewed_label(), "Arch Rock");
//! assert_eq!(summary.max_height_label(), "120.0 m");
//! # Ok::<(), bigwall::BigWallError>(())
//! ```

pub mod aggregate;
pub mod compute;
pub mod config;
pub mod error;
pub mod palette;
pub mod score;
pub mod session;
pub mod store;
pub mod summary;

pub use aggregate::{Aggregate, AggregationEngine, SortOrder};
pub use config::{Config, ScoreConfig};
pub use error::{BigWallError, Result};
pub use palette::{BandAssignment, ColorBander, HeightWarning, Palette};
pub use score::ScoreTransform;
pub use session::{Completion, QuerySession, QueryTicket, SessionStatus};
pub use store::{FeatureStore, FeatureStoreBuilder, SiteAssignment, StoreStats, VicinityActivity};
pub use summary::{FormationStyle, MostViewedSite, ResultSummary, SiteStyle};

pub use geo::{Point, Polygon, Rect};

pub use bigwall_types::collection::FeatureCollection;
pub use bigwall_types::formation::{FormationGeometry, FormationRecord};
pub use bigwall_types::site::SiteRecord;

pub use compute::spatial::{FeatureIndex, IndexStats, bounding_box, distance_between};

// Re-export validation and GeoJSON utilities
pub use compute::geojson;
pub use compute::validation;

pub mod prelude {
    //! Commonly used types for loading features and running queries.

    pub use crate::{BigWallError, Result};

    pub use crate::{Point, Polygon, Rect};

    pub use crate::{FeatureCollection, FormationGeometry, FormationRecord, SiteRecord};

    pub use crate::config::Config;
    pub use crate::store::FeatureStore;

    pub use crate::aggregate::{Aggregate, AggregationEngine, SortOrder};
    pub use crate::palette::ColorBander;
    pub use crate::score::ScoreTransform;
    pub use crate::session::{Completion, QuerySession};
    pub use crate::summary::ResultSummary;

    pub use crate::compute::geojson::{
        disk_to_geojson, formations_from_geojson, load_formations_from_path,
        load_sites_from_path, sites_from_geojson,
    };
    pub use crate::compute::spatial::distance_between;
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
