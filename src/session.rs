//! Generation-gated query session.
//!
//! Every user query bumps a generation counter and moves the session to
//! `Querying`. The query itself runs without holding any lock against the
//! immutable [`FeatureStore`]; its summary is accepted only if its generation
//! is still the current one when it completes. A slower query from an older
//! click that finishes after a newer one is dropped, so the resolved summary
//! always belongs to the latest request.
//!
//! ```text
//! Idle ──begin──▶ Querying(g) ──complete(g)──▶ Resolved(g)
//!   ▲                 │  ▲                          │
//!   └────clear────────┴──┴────────begin─────────────┘
//! ```

use crate::compute::geojson::disk_to_geojson;
use crate::compute::validation::{validate_query_center, validate_query_radius};
use crate::config::Config;
use crate::error::Result;
use crate::palette::{ColorBander, Palette};
use crate::score::ScoreTransform;
use crate::store::FeatureStore;
use crate::summary::ResultSummary;
use geo::Point;
use parking_lot::Mutex;
use std::sync::Arc;

/// One issued query: what to run and which generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryTicket {
    generation: u64,
    center: Point,
    radius: f64,
}

impl QueryTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

#[derive(Debug, Clone)]
enum SessionState {
    Idle,
    Querying(QueryTicket),
    Resolved(Arc<ResultSummary>),
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Querying { generation: u64 },
    Resolved { generation: u64 },
}

/// Outcome of handing a finished summary back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Accepted,
    /// Superseded by a newer request (or already resolved); the summary was dropped.
    Stale { generation: u64, current: u64 },
}

#[derive(Debug)]
struct SessionInner {
    generation: u64,
    state: SessionState,
}

/// Re-entrant query loop over a shared feature store.
///
/// `QuerySession` is `Send + Sync`: tickets may be evaluated on other threads
/// and completed in any order.
#[derive(Debug)]
pub struct QuerySession {
    store: Arc<FeatureStore>,
    score: ScoreTransform,
    bander: ColorBander,
    default_radius: f64,
    inner: Mutex<SessionInner>,
}

impl QuerySession {
    pub fn new(store: Arc<FeatureStore>) -> Self {
        Self {
            store,
            score: ScoreTransform::default(),
            bander: ColorBander::default(),
            default_radius: Config::default().query_radius_meters,
            inner: Mutex::new(SessionInner {
                generation: 0,
                state: SessionState::Idle,
            }),
        }
    }

    pub fn with_config(store: Arc<FeatureStore>, config: &Config) -> Result<Self> {
        config.ensure_valid()?;
        let palette = match &config.palette {
            Some(colors) => Palette::new(colors.clone())?,
            None => Palette::default(),
        };

        let mut session = Self::new(store);
        session.score = ScoreTransform::from_config(&config.score)?;
        session.bander = ColorBander::new(palette);
        session.default_radius = config.query_radius_meters;
        Ok(session)
    }

    pub fn store(&self) -> &Arc<FeatureStore> {
        &self.store
    }

    pub fn score(&self) -> &ScoreTransform {
        &self.score
    }

    pub fn bander(&self) -> &ColorBander {
        &self.bander
    }

    pub fn default_radius(&self) -> f64 {
        self.default_radius
    }

    /// Start a query at `center` with the configured radius.
    pub fn begin(&self, center: Point) -> Result<QueryTicket> {
        self.begin_with_radius(center, self.default_radius)
    }

    /// Start a query, superseding whatever the session was doing.
    ///
    /// Invalid parameters are rejected before the generation changes, so a bad
    /// request leaves the current state untouched.
    pub fn begin_with_radius(&self, center: Point, radius: f64) -> Result<QueryTicket> {
        validate_query_center(&center)?;
        validate_query_radius(radius)?;

        let mut inner = self.inner.lock();
        inner.generation += 1;
        let ticket = QueryTicket {
            generation: inner.generation,
            center,
            radius,
        };
        inner.state = SessionState::Querying(ticket);
        drop(inner);

        log::debug!(
            "Query generation {} started at ({}, {}) r={} m",
            ticket.generation,
            center.x(),
            center.y(),
            radius
        );
        Ok(ticket)
    }

    /// Run a ticket's range queries and reductions. Takes no session lock.
    pub fn evaluate(&self, ticket: &QueryTicket) -> Result<ResultSummary> {
        let sites = self.store.range_query_sites(&ticket.center, ticket.radius)?;
        let formations = self
            .store
            .range_query_formations(&ticket.center, ticket.radius)?;

        Ok(ResultSummary::compute(
            ticket.generation,
            ticket.center,
            ticket.radius,
            sites,
            formations,
            &self.score,
            &self.bander,
        ))
    }

    /// Offer a finished summary; it is kept only if its generation is still current.
    pub fn complete(&self, summary: ResultSummary) -> Completion {
        match self.resolve(summary) {
            Ok(_) => Completion::Accepted,
            Err(stale) => stale,
        }
    }

    /// Store `summary` if it is awaited and hand back the stored copy, decided
    /// under a single lock acquisition.
    fn resolve(&self, summary: ResultSummary) -> std::result::Result<Arc<ResultSummary>, Completion> {
        let mut inner = self.inner.lock();
        let current = inner.generation;
        let awaiting = matches!(
            inner.state,
            SessionState::Querying(ticket) if ticket.generation == summary.generation
        );

        if !awaiting {
            log::debug!(
                "Dropping stale result for generation {} (current {})",
                summary.generation,
                current
            );
            return Err(Completion::Stale {
                generation: summary.generation,
                current,
            });
        }

        log::debug!(
            "Query generation {} resolved: {} sites, {} formations",
            summary.generation,
            summary.site_count,
            summary.formation_count
        );
        let summary = Arc::new(summary);
        inner.state = SessionState::Resolved(Arc::clone(&summary));
        Ok(summary)
    }

    /// Begin, evaluate and complete in one call.
    ///
    /// Returns `None` if another request superseded this one while it ran.
    pub fn query(&self, center: Point) -> Result<Option<Arc<ResultSummary>>> {
        self.query_with_radius(center, self.default_radius)
    }

    pub fn query_with_radius(
        &self,
        center: Point,
        radius: f64,
    ) -> Result<Option<Arc<ResultSummary>>> {
        let ticket = self.begin_with_radius(center, radius)?;
        let summary = self.evaluate(&ticket)?;
        Ok(self.resolve(summary).ok())
    }

    /// Summary of the latest resolved query, if the session is resolved.
    pub fn current(&self) -> Option<Arc<ResultSummary>> {
        match &self.inner.lock().state {
            SessionState::Resolved(summary) => Some(Arc::clone(summary)),
            _ => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match &self.inner.lock().state {
            SessionState::Idle => SessionStatus::Idle,
            SessionState::Querying(ticket) => SessionStatus::Querying {
                generation: ticket.generation,
            },
            SessionState::Resolved(summary) => SessionStatus::Resolved {
                generation: summary.generation,
            },
        }
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Drop the current artifact and return to `Idle`.
    ///
    /// Outstanding queries become stale.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = SessionState::Idle;
    }

    /// GeoJSON outline of the active query disk, or `None` when idle.
    pub fn current_disk_geojson(&self) -> Result<Option<String>> {
        let active = match &self.inner.lock().state {
            SessionState::Idle => None,
            SessionState::Querying(ticket) => {
                Some((ticket.center, ticket.radius, ticket.generation))
            }
            SessionState::Resolved(summary) => {
                Some((summary.center, summary.radius_meters, summary.generation))
            }
        };
        active
            .map(|(center, radius, generation)| disk_to_geojson(&center, radius, Some(generation)))
            .transpose()
    }
}
