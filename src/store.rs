//! Immutable site and formation snapshots with their spatial indexes.
//!
//! A [`FeatureStore`] is built once from two fully materialized collections
//! and is read-only afterwards, so any number of queries can run against it
//! concurrently (share it behind an `Arc`).

use crate::compute::spatial::rtree::{FeatureIndex, Footprint, IndexStats};
use crate::compute::validation::{
    validate_finite_radius, validate_formations, validate_query_center, validate_sites,
};
use crate::error::Result;
use crate::score::ScoreTransform;
use bigwall_types::collection::FeatureCollection;
use bigwall_types::formation::FormationRecord;
use bigwall_types::site::SiteRecord;
use geo::{Point, Rect};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// A site paired with its closest formation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteAssignment<'a> {
    pub site: &'a SiteRecord,
    pub formation: &'a FormationRecord,
    /// Meters from the site to the formation footprint
    pub distance: f64,
}

/// Climbing activity recorded around one formation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VicinityActivity {
    pub num_sites: usize,
    pub num_rock_routes: u64,
    pub num_views: u64,
    /// `num_rock_routes * route_weight + num_views`
    pub raw_score: f64,
}

/// Statistics about a loaded store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub sites: IndexStats,
    pub formations: IndexStats,
}

/// Spatially indexed, read-only snapshots of both feature sets.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    sites: FeatureIndex<SiteRecord>,
    formations: FeatureIndex<FormationRecord>,
    site_ids: FxHashMap<String, usize>,
    formation_ids: FxHashMap<String, usize>,
}

impl FeatureStore {
    /// Validate and index both collections.
    pub fn load(
        sites: FeatureCollection<SiteRecord>,
        formations: FeatureCollection<FormationRecord>,
    ) -> Result<Self> {
        validate_sites(sites.as_slice())?;
        validate_formations(formations.as_slice())?;

        let site_ids = id_map("site", sites.iter().map(|s| s.id.as_str()));
        let formation_ids = id_map("formation", formations.iter().map(|f| f.id.as_str()));

        let store = Self {
            sites: FeatureIndex::build(sites),
            formations: FeatureIndex::build(formations),
            site_ids,
            formation_ids,
        };

        let stats = store.stats();
        log::info!(
            "Loaded feature store: {} sites, {} formations",
            stats.sites.indexed,
            stats.formations.indexed
        );
        if stats.formations.skipped > 0 {
            log::warn!(
                "{} formations have no usable footprint and will never match a query",
                stats.formations.skipped
            );
        }

        Ok(store)
    }

    pub fn builder() -> FeatureStoreBuilder {
        FeatureStoreBuilder::new()
    }

    pub fn sites(&self) -> &FeatureCollection<SiteRecord> {
        self.sites.records()
    }

    pub fn formations(&self) -> &FeatureCollection<FormationRecord> {
        self.formations.records()
    }

    pub fn site(&self, id: &str) -> Option<&SiteRecord> {
        self.site_ids.get(id).and_then(|&slot| self.sites.get(slot))
    }

    pub fn formation(&self, id: &str) -> Option<&FormationRecord> {
        self.formation_ids
            .get(id)
            .and_then(|&slot| self.formations.get(slot))
    }

    /// Sites intersecting the disk, in load order.
    ///
    /// With `radius <= 0` only a site located exactly at `center` matches.
    pub fn range_query_sites(&self, center: &Point, radius: f64) -> Result<Vec<&SiteRecord>> {
        range_query(&self.sites, center, radius)
    }

    /// Formations whose footprint intersects the disk, in load order.
    ///
    /// With `radius <= 0` only formations whose footprint contains `center` match.
    pub fn range_query_formations(
        &self,
        center: &Point,
        radius: f64,
    ) -> Result<Vec<&FormationRecord>> {
        range_query(&self.formations, center, radius)
    }

    pub fn sites_within_bbox(&self, rect: &Rect) -> Vec<&SiteRecord> {
        self.sites
            .query_within_rect(rect)
            .into_iter()
            .map(|slot| &self.sites.records()[slot])
            .collect()
    }

    pub fn formations_within_bbox(&self, rect: &Rect) -> Vec<&FormationRecord> {
        self.formations
            .query_within_rect(rect)
            .into_iter()
            .map(|slot| &self.formations.records()[slot])
            .collect()
    }

    /// Closest formation to `point` within `max_distance` meters.
    pub fn nearest_formation(
        &self,
        point: &Point,
        max_distance: f64,
    ) -> Result<Option<(&FormationRecord, f64)>> {
        validate_query_center(point)?;
        validate_finite_radius(max_distance)?;
        Ok(self
            .formations
            .nearest_within(point, max_distance)
            .map(|(slot, distance)| (&self.formations.records()[slot], distance)))
    }

    /// Pair every site with its closest formation within `threshold` meters.
    ///
    /// Sites with no formation in range are left out. Output follows site load order.
    pub fn assign_sites_to_formations(&self, threshold: f64) -> Result<Vec<SiteAssignment<'_>>> {
        validate_finite_radius(threshold)?;
        let assignments: Vec<SiteAssignment<'_>> = self
            .sites
            .records()
            .iter()
            .filter_map(|site| {
                self.formations
                    .nearest_within(&site.location, threshold)
                    .map(|(slot, distance)| SiteAssignment {
                        site,
                        formation: &self.formations.records()[slot],
                        distance,
                    })
            })
            .collect();

        log::debug!(
            "Assigned {} of {} sites to a formation within {} m",
            assignments.len(),
            self.sites.records().len(),
            threshold
        );
        Ok(assignments)
    }

    /// Sum route and view counts of sites within `radius` meters of a formation footprint.
    pub fn vicinity_activity(
        &self,
        formation: &FormationRecord,
        radius: f64,
        score: &ScoreTransform,
    ) -> Result<VicinityActivity> {
        validate_finite_radius(radius)?;

        let mut activity = VicinityActivity {
            num_sites: 0,
            num_rock_routes: 0,
            num_views: 0,
            raw_score: 0.0,
        };
        let Some(bounds) = formation.bounds() else {
            return Ok(activity);
        };

        for slot in self.sites.query_near_rect(&bounds, radius) {
            let site = &self.sites.records()[slot];
            if formation.distance_from(&site.location) <= radius {
                activity.num_sites += 1;
                activity.num_rock_routes = activity.num_rock_routes.saturating_add(site.num_rock_routes);
                activity.num_views = activity.num_views.saturating_add(site.num_views);
            }
        }
        activity.raw_score = score.raw_score_of(activity.num_rock_routes, activity.num_views);
        Ok(activity)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            sites: self.sites.stats(),
            formations: self.formations.stats(),
        }
    }
}

fn range_query<'a, T: Footprint>(
    index: &'a FeatureIndex<T>,
    center: &Point,
    radius: f64,
) -> Result<Vec<&'a T>> {
    validate_query_center(center)?;
    validate_finite_radius(radius)?;
    Ok(index
        .query_within_disk(center, radius)
        .into_iter()
        .map(|slot| &index.records()[slot])
        .collect())
}

fn id_map<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> FxHashMap<String, usize> {
    let mut map = FxHashMap::default();
    for (slot, id) in ids.enumerate() {
        if map.contains_key(id) {
            log::warn!("Duplicate {} id '{}' at index {}; lookups return the first", kind, id, slot);
            continue;
        }
        map.insert(id.to_string(), slot);
    }
    map
}

/// Builder for a [`FeatureStore`].
#[derive(Debug, Default)]
pub struct FeatureStoreBuilder {
    sites: Option<FeatureCollection<SiteRecord>>,
    formations: Option<FeatureCollection<FormationRecord>>,
}

impl FeatureStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sites(mut self, sites: FeatureCollection<SiteRecord>) -> Self {
        self.sites = Some(sites);
        self
    }

    pub fn formations(mut self, formations: FeatureCollection<FormationRecord>) -> Self {
        self.formations = Some(formations);
        self
    }

    /// Build the store. A collection that was never supplied is treated as empty.
    pub fn build(self) -> Result<FeatureStore> {
        if self.sites.is_none() {
            log::warn!("Building feature store without site records");
        }
        if self.formations.is_none() {
            log::warn!("Building feature store without formation records");
        }
        FeatureStore::load(
            self.sites.unwrap_or_default(),
            self.formations.unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::spatial::algorithms::earth_radius;
    use crate::error::BigWallError;
    use geo::polygon;

    fn north(origin: &Point, meters: f64) -> Point {
        Point::new(origin.x(), origin.y() + (meters / earth_radius()).to_degrees())
    }

    fn center() -> Point {
        Point::new(-119.6, 37.7)
    }

    fn store() -> FeatureStore {
        let c = center();
        let sites = FeatureCollection::new(vec![
            SiteRecord::new("s-near", north(&c, 400.0), 10, 50).with_name("Near Crag"),
            SiteRecord::new("s-mid", north(&c, 2_200.0), 4, 10),
            SiteRecord::new("s-far", north(&c, 9_000.0), 30, 900),
        ]);
        let wall = north(&c, 2_000.0);
        let footprint = polygon![
            (x: wall.x() - 0.002, y: wall.y() - 0.001),
            (x: wall.x() + 0.002, y: wall.y() - 0.001),
            (x: wall.x() + 0.002, y: wall.y() + 0.001),
            (x: wall.x() - 0.002, y: wall.y() + 0.001),
            (x: wall.x() - 0.002, y: wall.y() - 0.001),
        ];
        let formations = FeatureCollection::new(vec![
            FormationRecord::new("f-wall", footprint, 520.0),
            FormationRecord::new("f-boulder", north(&c, 450.0), 12.0),
        ]);
        FeatureStore::load(sites, formations).unwrap()
    }

    #[test]
    fn test_range_queries() {
        let store = store();
        let sites = store.range_query_sites(&center(), 500.0).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id(), "s-near");

        let formations = store.range_query_formations(&center(), 500.0).unwrap();
        assert_eq!(formations.len(), 1);
        assert_eq!(formations[0].id(), "f-boulder");

        let formations = store.range_query_formations(&center(), 2_000.0).unwrap();
        let ids: Vec<_> = formations.iter().map(|f| f.id()).collect();
        assert_eq!(ids, vec!["f-wall", "f-boulder"]);
    }

    #[test]
    fn test_range_query_rejects_non_finite() {
        let store = store();
        assert!(matches!(
            store.range_query_sites(&Point::new(f64::NAN, 37.7), 100.0),
            Err(BigWallError::InvalidQuery(_))
        ));
        assert!(matches!(
            store.range_query_formations(&center(), f64::INFINITY),
            Err(BigWallError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_non_positive_radius() {
        let store = store();
        assert!(store.range_query_sites(&center(), 0.0).unwrap().is_empty());
        assert!(store.range_query_sites(&center(), -25.0).unwrap().is_empty());

        let inside_wall = north(&center(), 2_000.0);
        let hits = store.range_query_formations(&inside_wall, 0.0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "f-wall");
    }

    #[test]
    fn test_load_rejects_bad_coordinates() {
        let sites = FeatureCollection::new(vec![SiteRecord::new("bad", Point::new(0.0, 100.0), 1, 1)]);
        let result = FeatureStore::load(sites, FeatureCollection::empty());
        assert!(matches!(result, Err(BigWallError::InvalidInput(_))));
    }

    #[test]
    fn test_lookup_by_id() {
        let store = store();
        assert_eq!(store.site("s-near").and_then(|s| s.name()), Some("Near Crag"));
        assert_eq!(store.formation("f-wall").map(|f| f.height()), Some(520.0));
        assert!(store.formation("missing").is_none());
    }

    #[test]
    fn test_nearest_formation() {
        let store = store();
        let (formation, distance) = store.nearest_formation(&center(), 600.0).unwrap().unwrap();
        assert_eq!(formation.id(), "f-boulder");
        assert!((distance - 450.0).abs() < 0.5);

        assert!(store.nearest_formation(&center(), 300.0).unwrap().is_none());
    }

    #[test]
    fn test_assign_sites_to_formations() {
        let store = store();
        let assignments = store.assign_sites_to_formations(300.0).unwrap();
        let pairs: Vec<_> = assignments
            .iter()
            .map(|a| (a.site.id(), a.formation.id()))
            .collect();
        // s-near is 50 m from the boulder, s-mid 89 m past the wall, s-far has nothing in range.
        assert_eq!(pairs, vec![("s-near", "f-boulder"), ("s-mid", "f-wall")]);
    }

    #[test]
    fn test_vicinity_activity() {
        let store = store();
        let wall = store.formation("f-wall").unwrap();
        let activity = store
            .vicinity_activity(wall, 800.0, &ScoreTransform::default())
            .unwrap();
        assert_eq!(activity.num_sites, 1);
        assert_eq!(activity.num_rock_routes, 4);
        assert_eq!(activity.num_views, 10);
        assert_eq!(activity.raw_score, 8_010.0);

        let wide = store
            .vicinity_activity(wall, 2_000.0, &ScoreTransform::default())
            .unwrap();
        assert_eq!(wide.num_sites, 2);
        assert_eq!(wide.num_rock_routes, 14);
    }

    #[test]
    fn test_bbox_clip() {
        let store = store();
        let rect = crate::compute::spatial::bounding_box(-119.61, 37.69, -119.59, 37.72).unwrap();
        let sites: Vec<_> = store.sites_within_bbox(&rect).iter().map(|s| s.id()).collect();
        assert_eq!(sites, vec!["s-near", "s-mid"]);
        assert_eq!(store.formations_within_bbox(&rect).len(), 2);
    }

    #[test]
    fn test_builder_defaults_to_empty() {
        let store = FeatureStore::builder().build().unwrap();
        assert!(store.sites().is_empty());
        assert!(store.range_query_formations(&center(), 1_000.0).unwrap().is_empty());

        let stats = FeatureStore::builder()
            .sites(FeatureCollection::new(vec![SiteRecord::new("a", center(), 0, 0)]))
            .build()
            .unwrap()
            .stats();
        assert_eq!(stats.sites.indexed, 1);
        assert_eq!(stats.formations.records, 0);
    }

    #[test]
    fn test_vicinity_activity_across_antimeridian() {
        let sites = FeatureCollection::new(vec![
            SiteRecord::new("taveuni-west", Point::new(-179.998, -16.8), 3, 40),
            SiteRecord::new("taveuni-east", Point::new(179.997, -16.8), 1, 10),
            SiteRecord::new("far", Point::new(-179.95, -16.8), 9, 900),
        ]);
        let formations = FeatureCollection::new(vec![FormationRecord::new(
            "seam",
            Point::new(179.999, -16.8),
            90.0,
        )]);
        let store = FeatureStore::load(sites, formations).unwrap();
        let seam = store.formation("seam").unwrap();

        let activity = store
            .vicinity_activity(seam, 800.0, &ScoreTransform::default())
            .unwrap();
        assert_eq!(activity.num_sites, 2);
        assert_eq!(activity.num_rock_routes, 4);
        assert_eq!(activity.num_views, 50);
    }
}
