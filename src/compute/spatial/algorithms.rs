//! Distance and intersection primitives for disk queries.
//!
//! Point-to-point distance is great-circle Haversine on the GRS80 mean
//! radius. Distances to polygon boundaries are measured in a local
//! equirectangular projection centred on the query point, which agrees with
//! Haversine to well under a meter at the kilometre scales a map click covers.

use crate::error::{BigWallError, Result};
use geo::{Destination, Distance, Haversine, HaversineMeasure, Intersects, LineString, Point, Polygon, Rect};

/// Mean Earth radius used for every metric conversion in this crate.
#[inline]
pub fn earth_radius() -> f64 {
    HaversineMeasure::GRS80_MEAN_RADIUS.radius()
}

/// Great-circle distance between two lon/lat points, in meters.
///
/// # Examples
///
/// ```rust
/// use bigwall::compute::spatial::distance_between;
/// use geo::Point;
///
/// let el_cap = Point::new(-119.6377, 37.7340);
/// let half_dome = Point::new(-119.5332, 37.7459);
/// let dist = distance_between(&el_cap, &half_dome);
/// assert!(dist > 9_000.0 && dist < 10_000.0);
/// ```
pub fn distance_between(point1: &Point, point2: &Point) -> f64 {
    Haversine.distance(*point1, *point2)
}

/// Project `point` onto a plane tangent at `origin`; returns (east, north) in meters.
pub fn point_to_local_meters(origin: &Point, point: &Point) -> (f64, f64) {
    let meters_per_degree = earth_radius().to_radians();
    let mut dlon = point.x() - origin.x();
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let dlat = point.y() - origin.y();
    let east = dlon * meters_per_degree * origin.y().to_radians().cos();
    let north = dlat * meters_per_degree;
    (east, north)
}

/// Distance from the origin of the local plane to the segment `a`-`b`.
#[inline]
fn origin_to_segment(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (-(a.0 * dx + a.1 * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (px, py) = (a.0 + t * dx, a.1 + t * dy);
    (px * px + py * py).sqrt()
}

fn distance_to_ring(center: &Point, ring: &LineString) -> f64 {
    let projected: Vec<(f64, f64)> = ring
        .coords()
        .map(|c| point_to_local_meters(center, &Point::from(*c)))
        .collect();

    match projected.len() {
        0 => f64::INFINITY,
        1 => {
            let (x, y) = projected[0];
            (x * x + y * y).sqrt()
        }
        _ => projected
            .windows(2)
            .map(|w| origin_to_segment(w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Distance in meters from `center` to the polygon; zero when the polygon covers it.
pub fn distance_to_polygon(center: &Point, polygon: &Polygon) -> f64 {
    if polygon.intersects(center) {
        return 0.0;
    }
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| distance_to_ring(center, ring))
        .fold(f64::INFINITY, f64::min)
}

/// Whether the polygon intersects the disk of `radius` meters around `center`.
///
/// With `radius <= 0` only polygons covering the exact center match.
pub fn disk_intersects_polygon(center: &Point, radius: f64, polygon: &Polygon) -> bool {
    if polygon.intersects(center) {
        return true;
    }
    if radius <= 0.0 {
        return false;
    }
    distance_to_polygon(center, polygon) <= radius
}

/// Approximate the query disk as a closed polygon with `segments` vertices.
///
/// Used to hand the current query's outline to a map surface.
pub fn disk_outline(center: &Point, radius: f64, segments: usize) -> Polygon {
    let segments = segments.max(3);
    let mut coords: Vec<geo::Coord> = (0..segments)
        .map(|i| {
            let bearing = 360.0 * i as f64 / segments as f64;
            Haversine.destination(*center, bearing, radius).0
        })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Polygon::new(LineString::new(coords), Vec::new())
}

/// Create a bounding box (Rect) from min/max coordinates.
///
/// # Errors
///
/// Returns an error if min > max for either coordinate
///
/// # Examples
///
/// ```rust
/// use bigwall::compute::spatial::bounding_box;
///
/// // Yosemite Valley
/// let bbox = bounding_box(-119.70, 37.70, -119.50, 37.78).unwrap();
/// assert!(bounding_box(-119.50, 37.70, -119.70, 37.78).is_err());
/// ```
pub fn bounding_box(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Rect> {
    if min_lon > max_lon {
        return Err(BigWallError::InvalidInput(format!(
            "min_lon ({}) must be <= max_lon ({})",
            min_lon, max_lon
        )));
    }
    if min_lat > max_lat {
        return Err(BigWallError::InvalidInput(format!(
            "min_lat ({}) must be <= max_lat ({})",
            min_lat, max_lat
        )));
    }

    Ok(Rect::new(
        geo::coord! { x: min_lon, y: min_lat },
        geo::coord! { x: max_lon, y: max_lat },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    /// Point `meters` due north of `origin`.
    fn north_of(origin: &Point, meters: f64) -> Point {
        Point::new(origin.x(), origin.y() + (meters / earth_radius()).to_degrees())
    }

    fn square_around(center: &Point, half_side_deg: f64) -> Polygon {
        let (x, y) = (center.x(), center.y());
        polygon![
            (x: x - half_side_deg, y: y - half_side_deg),
            (x: x + half_side_deg, y: y - half_side_deg),
            (x: x + half_side_deg, y: y + half_side_deg),
            (x: x - half_side_deg, y: y + half_side_deg),
            (x: x - half_side_deg, y: y - half_side_deg),
        ]
    }

    #[test]
    fn test_distance_between_due_north() {
        let origin = Point::new(-119.6, 37.7);
        let target = north_of(&origin, 400.0);
        let dist = distance_between(&origin, &target);
        assert!((dist - 400.0).abs() < 0.01, "got {}", dist);
    }

    #[test]
    fn test_local_projection_matches_haversine() {
        let origin = Point::new(-119.6, 37.7);
        let target = Point::new(-119.59, 37.705);
        let (e, n) = point_to_local_meters(&origin, &target);
        let planar = (e * e + n * n).sqrt();
        let sphere = distance_between(&origin, &target);
        assert!((planar - sphere).abs() < 1.0, "{} vs {}", planar, sphere);
    }

    #[test]
    fn test_local_projection_wraps_antimeridian() {
        let origin = Point::new(179.999, 0.0);
        let target = Point::new(-179.999, 0.0);
        let (e, _) = point_to_local_meters(&origin, &target);
        assert!(e > 0.0 && e < 300.0, "east offset {}", e);
    }

    #[test]
    fn test_polygon_containing_center() {
        let center = Point::new(-119.6, 37.7);
        let poly = square_around(&center, 0.001);
        assert_eq!(distance_to_polygon(&center, &poly), 0.0);
        assert!(disk_intersects_polygon(&center, 0.0, &poly));
        assert!(disk_intersects_polygon(&center, -5.0, &poly));
    }

    #[test]
    fn test_polygon_edge_within_radius() {
        let center = Point::new(-119.6, 37.7);
        let far_center = north_of(&center, 1000.0);
        // Square with half-side ~111 m, so its southern edge is ~889 m away.
        let poly = square_around(&far_center, 0.001);

        let dist = distance_to_polygon(&center, &poly);
        assert!((dist - 889.0).abs() < 2.0, "got {}", dist);
        assert!(disk_intersects_polygon(&center, 900.0, &poly));
        assert!(!disk_intersects_polygon(&center, 850.0, &poly));
        assert!(!disk_intersects_polygon(&center, 0.0, &poly));
    }

    #[test]
    fn test_disk_outline_radius() {
        let center = Point::new(-119.6, 37.7);
        let outline = disk_outline(&center, 1000.0, 32);
        assert_eq!(outline.exterior().0.len(), 33);
        for coord in outline.exterior().coords() {
            let dist = distance_between(&center, &Point::from(*coord));
            assert!((dist - 1000.0).abs() < 0.5, "vertex at {}", dist);
        }
    }

    #[test]
    fn test_bounding_box() {
        let bbox = bounding_box(-119.7, 37.7, -119.5, 37.8).unwrap();
        assert_eq!(bbox.min().x, -119.7);
        assert_eq!(bbox.max().y, 37.8);
        assert!(bounding_box(-119.7, 37.8, -119.5, 37.7).is_err());
    }
}
