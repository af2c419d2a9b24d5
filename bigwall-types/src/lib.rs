//! # bigwall-types
//!
//! Plain record types shared by the bigwall query engine and its data loaders.
//!
//! - **Site records**: point-like climbing areas with route and page-view counters
//! - **Formation records**: cliff footprints (point or polygon) with a height in meters
//! - **Feature collections**: immutable, arena-style sets of one record type
//!
//! All types are serializable with Serde and built on the `geo` crate's primitives.
//!
//! ## Examples
//!
//! ```rust
//! use bigwall_types::site::SiteRecord;
//! use bigwall_types::collection::FeatureCollection;
//! use geo::Point;
//!
//! let half_dome = SiteRecord::new("half-dome", Point::new(-119.5332, 37.7459), 42, 90_000)
//!     .with_name("Half Dome");
//! let sites = FeatureCollection::new(vec![half_dome]);
//! assert_eq!(sites.len(), 1);
//! ```

pub mod collection;
pub mod formation;
pub mod site;
