//! Per-query result summary handed back to the map surface.

use crate::aggregate::{Aggregate, AggregationEngine, SortOrder};
use crate::palette::{ColorBander, HeightWarning};
use crate::score::ScoreTransform;
use bigwall_types::formation::FormationRecord;
use bigwall_types::site::SiteRecord;
use geo::Point;
use serde::Serialize;

/// Marker size for one matched site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteStyle {
    pub id: String,
    pub weight: f64,
}

/// Fill color for one matched formation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormationStyle {
    pub id: String,
    pub band: usize,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<HeightWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostViewedSite {
    pub id: String,
    pub name: Option<String>,
    pub num_views: u64,
}

/// Aggregated answer for one query generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub generation: u64,
    pub center: Point,
    pub radius_meters: f64,
    pub site_count: usize,
    pub formation_count: usize,
    /// Sum of `num_rock_routes` over matched sites; `0` when none matched
    pub rock_route_sum: u64,
    /// Sum of `num_views` over matched sites; `0` when none matched
    pub view_sum: u64,
    pub most_viewed: Aggregate<MostViewedSite>,
    pub max_height: Aggregate<f64>,
    pub site_styles: Vec<SiteStyle>,
    pub formation_styles: Vec<FormationStyle>,
}

impl ResultSummary {
    /// Reduce one query's matches. Inputs must be in load order.
    pub fn compute(
        generation: u64,
        center: Point,
        radius_meters: f64,
        sites: Vec<&SiteRecord>,
        formations: Vec<&FormationRecord>,
        score: &ScoreTransform,
        bander: &ColorBander,
    ) -> Self {
        let sites = AggregationEngine::new(sites);
        let formations = AggregationEngine::new(formations);

        let most_viewed = sites
            .first_after_sort(|s| s.num_views, SortOrder::Descending)
            .map(|site| MostViewedSite {
                id: site.id.clone(),
                name: site.name.clone(),
                num_views: site.num_views,
            });

        let site_styles = sites
            .records()
            .iter()
            .map(|site| SiteStyle {
                id: site.id.clone(),
                weight: score.weight(site),
            })
            .collect();

        let formation_styles: Vec<FormationStyle> = formations
            .records()
            .iter()
            .map(|formation| {
                let band = bander.assign(formation.height);
                FormationStyle {
                    id: formation.id.clone(),
                    band: band.index,
                    color: bander.palette().color(band.index).unwrap_or_default().to_string(),
                    warning: band.warning,
                }
            })
            .collect();

        let clamped = formation_styles.iter().filter(|s| s.warning.is_some()).count();
        if clamped > 0 {
            log::warn!(
                "Query generation {}: {} formation heights clamped into the palette",
                generation,
                clamped
            );
        }

        Self {
            generation,
            center,
            radius_meters,
            site_count: sites.len(),
            formation_count: formations.len(),
            rock_route_sum: sites.sum(|s| s.num_rock_routes),
            view_sum: sites.sum(|s| s.num_views),
            most_viewed,
            max_height: formations.max(|f| f.height),
            site_styles,
            formation_styles,
        }
    }

    /// Name of the most viewed site, `"(unnamed)"`, or `"none found"`.
    pub fn most_viewed_label(&self) -> String {
        match &self.most_viewed {
            Aggregate::Value(site) => site.name.clone().unwrap_or_else(|| "(unnamed)".to_string()),
            Aggregate::NoData => Aggregate::<String>::NoData.to_string(),
        }
    }

    /// Max formation height as `"<h> m"`, or `"none found"`.
    pub fn max_height_label(&self) -> String {
        self.max_height.map(|h| format!("{:.1} m", h)).to_string()
    }

    /// Formations whose height was clamped, with the reason.
    pub fn height_warnings(&self) -> impl Iterator<Item = (&str, HeightWarning)> {
        self.formation_styles
            .iter()
            .filter_map(|style| style.warning.map(|w| (style.id.as_str(), w)))
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(sites: Vec<&SiteRecord>, formations: Vec<&FormationRecord>) -> ResultSummary {
        ResultSummary::compute(
            1,
            Point::new(-119.6, 37.7),
            1000.0,
            sites,
            formations,
            &ScoreTransform::default(),
            &ColorBander::default(),
        )
    }

    #[test]
    fn test_empty_summary_uses_sentinels() {
        let summary = summarize(Vec::new(), Vec::new());
        assert_eq!(summary.rock_route_sum, 0);
        assert_eq!(summary.view_sum, 0);
        assert!(summary.most_viewed.is_no_data());
        assert!(summary.max_height.is_no_data());
        assert_eq!(summary.most_viewed_label(), "none found");
        assert_eq!(summary.max_height_label(), "none found");
    }

    #[test]
    fn test_summary_values() {
        let p = Point::new(-119.6, 37.7);
        let a = SiteRecord::new("a", p, 3, 100).with_name("Alpha");
        let b = SiteRecord::new("b", p, 5, 400);
        let tall = FormationRecord::new("tall", p, 2_000.0);
        let short = FormationRecord::new("short", p, 85.0);

        let summary = summarize(vec![&a, &b], vec![&tall, &short]);
        assert_eq!(summary.site_count, 2);
        assert_eq!(summary.rock_route_sum, 8);
        assert_eq!(summary.view_sum, 500);
        assert_eq!(summary.most_viewed_label(), "(unnamed)");
        assert_eq!(summary.max_height, Aggregate::Value(2_000.0));
        assert_eq!(summary.max_height_label(), "2000.0 m");

        assert_eq!(summary.formation_styles[0].band, 39);
        assert_eq!(summary.formation_styles[1].band, 2);
        let warnings: Vec<_> = summary.height_warnings().map(|(id, _)| id).collect();
        assert_eq!(warnings, vec!["tall"]);

        let weight = summary.site_styles[0].weight;
        assert!((weight - (6_100.0_f64 / 2_000.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_height_is_not_no_data() {
        let flat = FormationRecord::new("flat", Point::new(-119.6, 37.7), 0.0);
        let summary = summarize(Vec::new(), vec![&flat]);
        assert_eq!(summary.max_height, Aggregate::Value(0.0));
        assert_eq!(summary.max_height_label(), "0.0 m");
    }

    #[test]
    fn test_summary_json() {
        let summary = summarize(Vec::new(), Vec::new());
        let json = summary.to_json().unwrap();
        assert!(json.contains(r#""max_height":{"status":"no_data"}"#), "{}", json);
    }
}
