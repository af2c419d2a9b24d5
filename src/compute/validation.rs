//! Validation for geographic coordinates, records, and query parameters.

use crate::error::{BigWallError, Result};
use bigwall_types::formation::{FormationGeometry, FormationRecord};
use bigwall_types::site::SiteRecord;
use geo::Point;

/// Validates a 2D point has valid longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use bigwall::compute::validation::validate_geographic_point;
/// use geo::Point;
///
/// let el_cap = Point::new(-119.6377, 37.7340);
/// assert!(validate_geographic_point(&el_cap).is_ok());
///
/// let invalid = Point::new(-119.6, 95.0);
/// assert!(validate_geographic_point(&invalid).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(BigWallError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(BigWallError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(BigWallError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(BigWallError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

/// Validates all polygon coordinates (exterior and interior rings).
pub fn validate_polygon(polygon: &geo::Polygon) -> Result<()> {
    if polygon.exterior().0.is_empty() {
        return Err(BigWallError::InvalidInput(
            "Polygon exterior ring is empty".to_string(),
        ));
    }

    for (idx, coord) in polygon.exterior().coords().enumerate() {
        let point = Point::from(*coord);
        validate_geographic_point(&point).map_err(|e| {
            BigWallError::InvalidInput(format!("Exterior ring point at index {}: {}", idx, e))
        })?;
    }

    for (ring_idx, interior) in polygon.interiors().iter().enumerate() {
        for (idx, coord) in interior.coords().enumerate() {
            let point = Point::from(*coord);
            validate_geographic_point(&point).map_err(|e| {
                BigWallError::InvalidInput(format!(
                    "Interior ring {} point at index {}: {}",
                    ring_idx, idx, e
                ))
            })?;
        }
    }

    Ok(())
}

/// Validates the location of every site.
pub fn validate_sites(sites: &[SiteRecord]) -> Result<()> {
    for (idx, site) in sites.iter().enumerate() {
        validate_geographic_point(&site.location).map_err(|e| {
            BigWallError::InvalidInput(format!("Site '{}' at index {}: {}", site.id, idx, e))
        })?;
    }
    Ok(())
}

/// Validates the footprint of every formation.
///
/// Heights are not checked; out-of-range heights are clamped when banded.
pub fn validate_formations(formations: &[FormationRecord]) -> Result<()> {
    for (idx, formation) in formations.iter().enumerate() {
        let checked = match &formation.geometry {
            FormationGeometry::Point(point) => validate_geographic_point(point),
            FormationGeometry::Polygon(polygon) => validate_polygon(polygon),
        };
        checked.map_err(|e| {
            BigWallError::InvalidInput(format!(
                "Formation '{}' at index {}: {}",
                formation.id, idx, e
            ))
        })?;
    }
    Ok(())
}

/// Validates a query center; failures are reported as rejected queries.
pub fn validate_query_center(center: &Point) -> Result<()> {
    validate_geographic_point(center)
        .map_err(|e| BigWallError::InvalidQuery(format!("Query center: {}", e)))
}

/// Validates a radius for a store-level range query: finite, sign unrestricted.
pub fn validate_finite_radius(radius: f64) -> Result<()> {
    if !radius.is_finite() {
        return Err(BigWallError::InvalidQuery(format!(
            "Radius must be finite, got: {}",
            radius
        )));
    }
    Ok(())
}

/// Validates a radius for a user-initiated query: finite and strictly positive.
pub fn validate_query_radius(radius: f64) -> Result<()> {
    validate_finite_radius(radius)?;
    if radius <= 0.0 {
        return Err(BigWallError::InvalidQuery(format!(
            "Radius must be positive, got: {}",
            radius
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_valid_geographic_point() {
        assert!(validate_geographic_point(&Point::new(-119.6, 37.7)).is_ok());
        assert!(validate_geographic_point(&Point::new(180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(-180.0, -90.0)).is_ok());
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(validate_geographic_point(&Point::new(200.0, 40.0)).is_err());
        assert!(validate_geographic_point(&Point::new(-74.0, -95.0)).is_err());
        assert!(validate_geographic_point(&Point::new(f64::NAN, 40.0)).is_err());
        assert!(validate_geographic_point(&Point::new(-74.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_query_center_maps_to_invalid_query() {
        let err = validate_query_center(&Point::new(f64::NAN, 0.0)).unwrap_err();
        assert!(matches!(err, BigWallError::InvalidQuery(_)));
    }

    #[test]
    fn test_query_radius() {
        assert!(validate_query_radius(500.0).is_ok());
        assert!(validate_query_radius(0.0).is_err());
        assert!(validate_query_radius(-1.0).is_err());
        assert!(validate_query_radius(f64::NAN).is_err());

        assert!(validate_finite_radius(0.0).is_ok());
        assert!(validate_finite_radius(-3.0).is_ok());
        assert!(validate_finite_radius(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_sites_reports_id() {
        let sites = vec![
            SiteRecord::new("ok", Point::new(-119.6, 37.7), 1, 1),
            SiteRecord::new("broken", Point::new(999.0, 37.7), 1, 1),
        ];
        let err = validate_sites(&sites).unwrap_err().to_string();
        assert!(err.contains("broken"), "{}", err);
    }

    #[test]
    fn test_validate_formations_allows_odd_heights() {
        let poly: geo::Polygon = polygon![
            (x: -119.6, y: 37.7),
            (x: -119.5, y: 37.7),
            (x: -119.5, y: 37.8),
            (x: -119.6, y: 37.7),
        ];
        let formations = vec![
            FormationRecord::new("tall", poly, 1_000_000.0),
            FormationRecord::new("negative", Point::new(-119.6, 37.7), -5.0),
        ];
        assert!(validate_formations(&formations).is_ok());

        let bad = vec![FormationRecord::new("bad", Point::new(0.0, 91.0), 10.0)];
        assert!(validate_formations(&bad).is_err());
    }
}
