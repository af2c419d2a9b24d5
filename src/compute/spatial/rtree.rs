//! R*-tree index over an immutable feature collection.
//!
//! Every record is indexed by its lon/lat bounding box (a degenerate box for
//! points, the footprint bounds for polygons). Disk queries run in two steps:
//!
//! 1. **Envelope pruning**: compute the minimal lon/lat box containing the
//!    disk and collect the records whose boxes intersect it.
//! 2. **Exact filtering**: test each candidate's real geometry against the
//!    disk with [`Footprint::intersects_disk`].
//!
//! Matches are returned as arena slots in ascending order, so results follow
//! load order no matter how the tree happens to be laid out.

use crate::compute::spatial::algorithms::{
    disk_intersects_polygon, distance_between, distance_to_polygon, earth_radius,
};
use bigwall_types::collection::FeatureCollection;
use bigwall_types::formation::{FormationGeometry, FormationRecord};
use bigwall_types::site::SiteRecord;
use geo::{Coord, Intersects, Point, Rect};
use rstar::{AABB, RTree, RTreeObject};
use std::f64::consts::FRAC_PI_2;

/// Slack added to envelope half-spans so records on the exact rim survive
/// floating-point rounding in the prune.
const ENVELOPE_PAD_DEGREES: f64 = 1e-9;

/// Separation below which two points count as the same place. Haversine
/// leaves nanometre residue across the antimeridian and between pole
/// longitudes.
const COINCIDENT_METERS: f64 = 1e-6;

fn coincident(a: &Point, b: &Point) -> bool {
    distance_between(a, b) <= COINCIDENT_METERS
}

/// Geometry hooks the index needs from a record type.
pub trait Footprint {
    /// Lon/lat bounds of the record, or `None` if it has no usable geometry.
    fn bounds(&self) -> Option<Rect>;

    /// Whether the record's geometry intersects the disk of `radius` meters.
    fn intersects_disk(&self, center: &Point, radius: f64) -> bool;

    /// Distance in meters from `point` to the record's geometry.
    fn distance_from(&self, point: &Point) -> f64;

    fn intersects_rect(&self, rect: &Rect) -> bool;
}

impl Footprint for SiteRecord {
    fn bounds(&self) -> Option<Rect> {
        Some(Rect::new(self.location.0, self.location.0))
    }

    fn intersects_disk(&self, center: &Point, radius: f64) -> bool {
        if radius <= 0.0 {
            return coincident(center, &self.location);
        }
        distance_between(center, &self.location) <= radius
    }

    fn distance_from(&self, point: &Point) -> f64 {
        distance_between(point, &self.location)
    }

    fn intersects_rect(&self, rect: &Rect) -> bool {
        rect.intersects(&self.location)
    }
}

impl Footprint for FormationRecord {
    fn bounds(&self) -> Option<Rect> {
        self.geometry.bounding_rect()
    }

    fn intersects_disk(&self, center: &Point, radius: f64) -> bool {
        match &self.geometry {
            FormationGeometry::Point(location) => {
                if radius <= 0.0 {
                    coincident(center, location)
                } else {
                    distance_between(center, location) <= radius
                }
            }
            FormationGeometry::Polygon(polygon) => disk_intersects_polygon(center, radius, polygon),
        }
    }

    fn distance_from(&self, point: &Point) -> f64 {
        match &self.geometry {
            FormationGeometry::Point(location) => distance_between(point, location),
            FormationGeometry::Polygon(polygon) => distance_to_polygon(point, polygon),
        }
    }

    fn intersects_rect(&self, rect: &Rect) -> bool {
        match &self.geometry {
            FormationGeometry::Point(location) => rect.intersects(location),
            FormationGeometry::Polygon(polygon) => rect.intersects(polygon),
        }
    }
}

/// Bounding box entry pointing back at an arena slot.
#[derive(Debug, Clone, PartialEq)]
struct IndexedFeature {
    slot: usize,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

/// Read-only spatial index over one feature collection.
#[derive(Debug, Clone)]
pub struct FeatureIndex<T> {
    records: FeatureCollection<T>,
    tree: RTree<IndexedFeature>,
    /// Records without usable bounds; they never match a query.
    skipped: usize,
}

impl<T: Footprint> FeatureIndex<T> {
    /// Bulk-load the index from a collection snapshot.
    pub fn build(records: FeatureCollection<T>) -> Self {
        let mut skipped = 0;
        let entries: Vec<IndexedFeature> = records
            .iter()
            .enumerate()
            .filter_map(|(slot, record)| {
                let Some(rect) = record.bounds() else {
                    skipped += 1;
                    return None;
                };
                Some(IndexedFeature {
                    slot,
                    min_x: rect.min().x,
                    min_y: rect.min().y,
                    max_x: rect.max().x,
                    max_y: rect.max().y,
                })
            })
            .collect();

        Self {
            records,
            tree: RTree::bulk_load(entries),
            skipped,
        }
    }

    pub fn records(&self) -> &FeatureCollection<T> {
        &self.records
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.records.get(slot)
    }

    /// Arena slots of records intersecting the disk, ascending.
    ///
    /// With `radius <= 0` only records whose geometry contains `center` match.
    /// Callers validate `center` and `radius` beforehand.
    pub fn query_within_disk(&self, center: &Point, radius: f64) -> Vec<usize> {
        let mut slots: Vec<usize> = Vec::new();
        for envelope in compute_envelopes(center.0, center.0, radius.max(0.0), center.y()) {
            for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
                if self.records[entry.slot].intersects_disk(center, radius) {
                    slots.push(entry.slot);
                }
            }
        }
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Closest record within `max_distance` meters, with its distance.
    ///
    /// Ties go to the lowest arena slot.
    pub fn nearest_within(&self, point: &Point, max_distance: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for slot in self.query_within_disk(point, max_distance) {
            let distance = self.records[slot].distance_from(point);
            if !distance.is_finite() {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((slot, distance)),
            }
        }
        best
    }

    /// Arena slots of records whose bounds come within `distance` meters of
    /// `rect`, ascending.
    ///
    /// Candidates only: callers filter them with an exact distance test.
    pub fn query_near_rect(&self, rect: &Rect, distance: f64) -> Vec<usize> {
        let distance = distance.max(0.0);
        // Polygon distances are measured in a plane at the record's own
        // latitude, up to `distance` poleward of the box.
        let widest_lat = rect.min().y.abs().max(rect.max().y.abs());
        let span_lat = (widest_lat + (distance / earth_radius()).to_degrees()).min(90.0);

        let mut slots: Vec<usize> = Vec::new();
        for envelope in compute_envelopes(rect.min(), rect.max(), distance, span_lat) {
            slots.extend(
                self.tree
                    .locate_in_envelope_intersecting(&envelope)
                    .map(|entry| entry.slot),
            );
        }
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Arena slots of records intersecting a lon/lat rectangle, ascending.
    pub fn query_within_rect(&self, rect: &Rect) -> Vec<usize> {
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        let mut slots: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| self.records[entry.slot].intersects_rect(rect))
            .map(|entry| entry.slot)
            .collect();
        slots.sort_unstable();
        slots
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            records: self.records.len(),
            indexed: self.tree.size(),
            skipped: self.skipped,
        }
    }
}

/// Statistics about a feature index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Records in the underlying collection
    pub records: usize,
    /// Records present in the tree
    pub indexed: usize,
    /// Records left out for lack of geometry
    pub skipped: usize,
}

/// Lat/lon half-spans in degrees of a spherical cap of `radius` meters
/// centred at latitude `lat`.
///
/// The longitude span is `asin(sin(r/R) / cos(lat))`, never less than the
/// planar `r / (R cos(lat))` used for polygon boundary distances. A cap that
/// contains a pole spans every longitude and reports 180.
fn compute_lat_lon_degrees(lat: f64, radius: f64) -> (f64, f64) {
    let angular = radius / earth_radius();
    let lat_degrees = angular.to_degrees() + ENVELOPE_PAD_DEGREES;

    let cos_lat = lat.to_radians().cos();
    if angular >= FRAC_PI_2 || angular.sin() >= cos_lat {
        return (lat_degrees, 180.0);
    }
    let spherical = (angular.sin() / cos_lat).asin();
    let planar = angular / cos_lat;
    let lon_degrees = spherical.max(planar).to_degrees() + ENVELOPE_PAD_DEGREES;
    (lat_degrees, lon_degrees.min(180.0))
}

/// Envelopes covering every point within `radius` meters of the box
/// `min`..`max`, split in two when they cross the antimeridian.
///
/// The longitude span is taken at `span_lat`, which must be at least as far
/// poleward as every latitude the exact filter measures from. A disk query
/// passes its center as a degenerate box.
fn compute_envelopes(min: Coord, max: Coord, radius: f64, span_lat: f64) -> Vec<AABB<[f64; 2]>> {
    let (lat_degrees, lon_degrees) = compute_lat_lon_degrees(span_lat, radius);

    let min_y = (min.y - lat_degrees).max(-90.0);
    let max_y = (max.y + lat_degrees).min(90.0);

    // Reaches over a pole or wraps the globe: every longitude is in play.
    let touches_pole = max.y + lat_degrees >= 90.0 || min.y - lat_degrees <= -90.0;
    if touches_pole || lon_degrees >= 180.0 {
        return vec![AABB::from_corners([-180.0, min_y], [180.0, max_y])];
    }

    let min_x = min.x - lon_degrees;
    let max_x = max.x + lon_degrees;

    let mut envelopes = vec![AABB::from_corners(
        [min_x.max(-180.0), min_y],
        [max_x.min(180.0), max_y],
    )];
    // -180 and 180 are the same meridian, so touching either edge wraps.
    if min_x <= -180.0 {
        envelopes.push(AABB::from_corners([min_x + 360.0, min_y], [180.0, max_y]));
    }
    if max_x >= 180.0 {
        envelopes.push(AABB::from_corners([-180.0, min_y], [max_x - 360.0, max_y]));
    }
    envelopes
}
