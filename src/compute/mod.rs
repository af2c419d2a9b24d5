//! Spatial algorithms, indexing, validation, and GeoJSON conversion.

pub mod geojson;
pub mod spatial;
pub mod validation;
