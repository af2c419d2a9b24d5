use geo::{BoundingRect, Centroid, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Footprint of a cliff formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormationGeometry {
    Point(Point),
    Polygon(Polygon),
}

impl FormationGeometry {
    /// Representative location: the point itself, or the polygon centroid.
    ///
    /// Degenerate polygons with no area fall back to their first exterior vertex.
    pub fn representative_point(&self) -> Option<Point> {
        match self {
            FormationGeometry::Point(point) => Some(*point),
            FormationGeometry::Polygon(polygon) => polygon
                .centroid()
                .or_else(|| polygon.exterior().coords().next().map(|c| Point::from(*c))),
        }
    }

    /// Axis-aligned bounds in lon/lat degrees.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            FormationGeometry::Point(point) => Some(Rect::new(point.0, point.0)),
            FormationGeometry::Polygon(polygon) => polygon.bounding_rect(),
        }
    }
}

impl From<Point> for FormationGeometry {
    fn from(point: Point) -> Self {
        FormationGeometry::Point(point)
    }
}

impl From<Polygon> for FormationGeometry {
    fn from(polygon: Polygon) -> Self {
        FormationGeometry::Polygon(polygon)
    }
}

/// An area feature (cliff-like formation) with a measured height in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationRecord {
    pub id: String,
    pub geometry: FormationGeometry,
    pub height: f64,
}

impl FormationRecord {
    pub fn new(id: impl Into<String>, geometry: impl Into<FormationGeometry>, height: f64) -> Self {
        Self {
            id: id.into(),
            geometry: geometry.into(),
            height,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn geometry(&self) -> &FormationGeometry {
        &self.geometry
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_point_geometry_representative() {
        let geom = FormationGeometry::from(Point::new(-119.6, 37.7));
        assert_eq!(geom.representative_point(), Some(Point::new(-119.6, 37.7)));

        let rect = geom.bounding_rect().unwrap();
        assert_eq!(rect.min().x, -119.6);
        assert_eq!(rect.max().y, 37.7);
    }

    #[test]
    fn test_polygon_centroid() {
        let poly: Polygon = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        let formation = FormationRecord::new("f1", poly, 350.0);

        let centroid = formation.geometry().representative_point().unwrap();
        assert!((centroid.x() - 1.0).abs() < 1e-9);
        assert!((centroid.y() - 1.0).abs() < 1e-9);

        let rect = formation.geometry().bounding_rect().unwrap();
        assert_eq!(rect.max().x, 2.0);
    }
}
