//! GeoJSON ingestion of site/formation snapshots and export of query outlines.
//!
//! Sites are read from Point features with `num_rock_routes`, `num_views` and
//! an optional `name` property. Formations are read from Point or Polygon
//! features with a numeric `height` property (meters). Feature ids are taken
//! from the feature `id` member, then an `id` property, then the feature's
//! position in the collection.

use crate::compute::spatial::algorithms::disk_outline;
use crate::error::{BigWallError, Result};
use bigwall_types::collection::FeatureCollection as Records;
use bigwall_types::formation::{FormationGeometry, FormationRecord};
use bigwall_types::site::SiteRecord;
use geo::{Point, Polygon};
use geojson::{Feature, GeoJson, Geometry, JsonObject, Value, feature::Id};
use serde_json::Map;
use std::path::Path;

/// Vertex count used when exporting a query disk.
const DISK_SEGMENTS: usize = 64;

fn parse_features(geojson: &str) -> Result<Vec<Feature>> {
    let parsed: GeoJson = geojson
        .parse()
        .map_err(|e| BigWallError::InvalidFormat(format!("Failed to parse GeoJSON: {}", e)))?;

    match parsed {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(BigWallError::InvalidFormat(
            "Expected a FeatureCollection, got a bare Geometry".to_string(),
        )),
    }
}

fn feature_id(feature: &Feature, position: usize) -> String {
    match &feature.id {
        Some(Id::String(id)) => id.clone(),
        Some(Id::Number(id)) => id.to_string(),
        None => match property(feature, "id") {
            Some(serde_json::Value::String(id)) => id.clone(),
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => position.to_string(),
        },
    }
}

fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a serde_json::Value> {
    feature
        .properties
        .as_ref()
        .and_then(|props| props.get(key))
        .filter(|value| !value.is_null())
}

/// Reads a non-negative counter; exports commonly store counts as floats.
fn counter(feature: &Feature, id: &str, key: &str) -> Result<u64> {
    let Some(value) = property(feature, key) else {
        return Ok(0);
    };
    if let Some(count) = value.as_u64() {
        return Ok(count);
    }
    match value.as_f64() {
        Some(count) if count.is_finite() && count >= 0.0 => Ok(count.round() as u64),
        _ => Err(BigWallError::InvalidInput(format!(
            "Feature '{}': '{}' must be a non-negative number, got {}",
            id, key, value
        ))),
    }
}

fn to_coord(position: &[f64]) -> Result<geo::Coord> {
    if position.len() < 2 {
        return Err(BigWallError::InvalidInput(
            "Coordinate must have at least 2 values".to_string(),
        ));
    }
    Ok(geo::Coord {
        x: position[0],
        y: position[1],
    })
}

fn to_ring(positions: &[Vec<f64>]) -> Result<geo::LineString> {
    let coords = positions
        .iter()
        .map(|p| to_coord(p))
        .collect::<Result<Vec<_>>>()?;
    Ok(geo::LineString::from(coords))
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon> {
    let Some((exterior, interiors)) = rings.split_first() else {
        return Err(BigWallError::InvalidInput(
            "Polygon must have at least one ring".to_string(),
        ));
    };
    let interiors = interiors
        .iter()
        .map(|ring| to_ring(ring))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(to_ring(exterior)?, interiors))
}

fn geometry_value<'a>(feature: &'a Feature, id: &str) -> Result<&'a Value> {
    feature
        .geometry
        .as_ref()
        .map(|geom| &geom.value)
        .ok_or_else(|| BigWallError::InvalidInput(format!("Feature '{}' has no geometry", id)))
}

/// Parses a GeoJSON FeatureCollection of climbing sites.
///
/// # Examples
///
/// ```
/// use bigwall::compute::geojson::sites_from_geojson;
///
/// let json = r#"{
///   "type": "FeatureCollection",
///   "features": [{
///     "type": "Feature",
///     "id": "el-cap",
///     "geometry": {"type": "Point", "coordinates": [-119.6377, 37.7340]},
///     "properties": {"num_rock_routes": 120, "num_views": 250000, "name": "El Capitan"}
///   }]
/// }"#;
/// let sites = sites_from_geojson(json).unwrap();
/// assert_eq!(sites[0].name(), Some("El Capitan"));
/// ```
pub fn sites_from_geojson(geojson: &str) -> Result<Records<SiteRecord>> {
    let features = parse_features(geojson)?;
    let mut sites = Vec::with_capacity(features.len());

    for (position, feature) in features.iter().enumerate() {
        let id = feature_id(feature, position);
        let location = match geometry_value(feature, &id)? {
            Value::Point(coords) => Point::from(to_coord(coords)?),
            _ => {
                return Err(BigWallError::InvalidInput(format!(
                    "Site '{}' geometry is not a Point",
                    id
                )));
            }
        };

        let name = match property(feature, "name") {
            Some(serde_json::Value::String(name)) => Some(name.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        };

        sites.push(SiteRecord {
            num_rock_routes: counter(feature, &id, "num_rock_routes")?,
            num_views: counter(feature, &id, "num_views")?,
            id,
            location,
            name,
        });
    }

    log::debug!("Parsed {} site features", sites.len());
    Ok(Records::new(sites))
}

/// Parses a GeoJSON FeatureCollection of cliff formations.
pub fn formations_from_geojson(geojson: &str) -> Result<Records<FormationRecord>> {
    let features = parse_features(geojson)?;
    let mut formations = Vec::with_capacity(features.len());

    for (position, feature) in features.iter().enumerate() {
        let id = feature_id(feature, position);
        let geometry = match geometry_value(feature, &id)? {
            Value::Point(coords) => FormationGeometry::Point(Point::from(to_coord(coords)?)),
            Value::Polygon(rings) => FormationGeometry::Polygon(to_polygon(rings)?),
            _ => {
                return Err(BigWallError::InvalidInput(format!(
                    "Formation '{}' geometry must be a Point or Polygon",
                    id
                )));
            }
        };

        let height = property(feature, "height")
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| {
                BigWallError::InvalidInput(format!(
                    "Formation '{}' is missing a numeric 'height'",
                    id
                ))
            })?;

        formations.push(FormationRecord { id, geometry, height });
    }

    log::debug!("Parsed {} formation features", formations.len());
    Ok(Records::new(formations))
}

pub fn load_sites_from_path<P: AsRef<Path>>(path: P) -> Result<Records<SiteRecord>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    sites_from_geojson(&text)
}

pub fn load_formations_from_path<P: AsRef<Path>>(path: P) -> Result<Records<FormationRecord>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    formations_from_geojson(&text)
}

fn polygon_geometry(polygon: &Polygon) -> Geometry {
    let mut rings = Vec::with_capacity(1 + polygon.interiors().len());
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        rings.push(ring.coords().map(|c| vec![c.x, c.y]).collect());
    }
    Geometry::new(Value::Polygon(rings))
}

/// Converts a Polygon to GeoJSON.
pub fn polygon_to_geojson(polygon: &Polygon) -> Result<String> {
    serde_json::to_string(&polygon_geometry(polygon)).map_err(|e| {
        BigWallError::SerializationErrorWithContext(format!("Failed to serialize polygon: {}", e))
    })
}

/// Renders a query disk as a GeoJSON Feature for the map surface.
///
/// The feature carries `radius_meters` and, when given, the query `generation`
/// so a map layer can tell which session drew it.
pub fn disk_to_geojson(center: &Point, radius: f64, generation: Option<u64>) -> Result<String> {
    let mut props: JsonObject = Map::new();
    props.insert("radius_meters".to_string(), serde_json::json!(radius));
    if let Some(generation) = generation {
        props.insert("generation".to_string(), serde_json::json!(generation));
    }

    let feature = Feature {
        bbox: None,
        geometry: Some(polygon_geometry(&disk_outline(center, radius, DISK_SEGMENTS))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    };

    serde_json::to_string(&feature).map_err(|e| {
        BigWallError::SerializationErrorWithContext(format!("Failed to serialize disk: {}", e))
    })
}
