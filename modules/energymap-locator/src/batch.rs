//! Batch runner: many articles through one pipeline with bounded
//! concurrency. Geocoding throughput is bounded separately by the shared
//! rate limiter inside the geocoder.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use energymap_common::{LocationTier, LocatorConfig, ProcessingOutcome};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LocatorError;
use crate::pipeline::LocationPipeline;

/// Article ids currently being processed. Share one set between runners
/// that may overlap so an article is never processed twice at once.
#[derive(Debug, Default)]
pub struct InFlightSet {
    ids: Mutex<HashSet<Uuid>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, or `None` if someone else holds it. Released on drop.
    pub fn try_claim(&self, id: Uuid) -> Option<InFlightGuard<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(|p| p.into_inner());
        if ids.insert(id) {
            Some(InFlightGuard { set: self, id })
        } else {
            None
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct InFlightGuard<'a> {
    set: &'a InFlightSet,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .ids
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.id);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleFailure {
    pub article_id: Uuid,
    pub error: String,
}

/// Counters for one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub skipped: usize,
    pub defaulted: usize,
    pub resolved_facility: usize,
    pub resolved_regional: usize,
    pub resolved_national: usize,
    pub failures: Vec<ArticleFailure>,
}

impl BatchReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            total: 0,
            skipped: 0,
            defaulted: 0,
            resolved_facility: 0,
            resolved_regional: 0,
            resolved_national: 0,
            failures: Vec::new(),
        }
    }

    fn record(&mut self, id: Uuid, result: Result<ProcessingOutcome, LocatorError>) {
        self.total += 1;
        match result {
            Ok(ProcessingOutcome::Skipped) => self.skipped += 1,
            Ok(ProcessingOutcome::Defaulted { .. }) => self.defaulted += 1,
            Ok(ProcessingOutcome::Resolved { tier, .. }) => match tier {
                LocationTier::Facility => self.resolved_facility += 1,
                LocationTier::Regional => self.resolved_regional += 1,
                LocationTier::National => self.resolved_national += 1,
            },
            Err(e) => self.failures.push(ArticleFailure {
                article_id: id,
                error: e.to_string(),
            }),
        }
    }

    pub fn resolved(&self) -> usize {
        self.resolved_facility + self.resolved_regional + self.resolved_national
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

pub struct BatchRunner {
    pipeline: Arc<LocationPipeline>,
    concurrency: usize,
    in_flight: Arc<InFlightSet>,
}

impl BatchRunner {
    pub fn new(pipeline: Arc<LocationPipeline>, concurrency: usize) -> Self {
        Self {
            pipeline,
            concurrency: concurrency.max(1),
            in_flight: Arc::new(InFlightSet::new()),
        }
    }

    pub fn from_config(pipeline: Arc<LocationPipeline>, config: &LocatorConfig) -> Self {
        Self::new(pipeline, config.batch_concurrency)
    }

    /// Share an in-flight set with other runners.
    pub fn with_in_flight(mut self, in_flight: Arc<InFlightSet>) -> Self {
        self.in_flight = in_flight;
        self
    }

    pub fn in_flight(&self) -> &Arc<InFlightSet> {
        &self.in_flight
    }

    /// Process every id. Per-article failures are collected in the report;
    /// the batch always runs to the end.
    pub async fn run(&self, ids: impl IntoIterator<Item = Uuid>) -> BatchReport {
        let mut report = BatchReport::new(Utc::now());
        info!(concurrency = self.concurrency, "Location batch starting");

        let results: Vec<(Uuid, Result<ProcessingOutcome, LocatorError>)> = stream::iter(ids)
            .map(|id| async move { (id, self.process_one(id).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (id, result) in results {
            if let Err(e) = &result {
                warn!(article_id = %id, error = %e, "Article failed in batch");
            }
            report.record(id, result);
        }

        report.finished_at = Utc::now();
        info!(
            total = report.total,
            skipped = report.skipped,
            defaulted = report.defaulted,
            resolved = report.resolved(),
            failed = report.failed(),
            "Location batch complete"
        );
        report
    }

    async fn process_one(&self, id: Uuid) -> Result<ProcessingOutcome, LocatorError> {
        let Some(_guard) = self.in_flight.try_claim(id) else {
            return Err(LocatorError::AlreadyInFlight(id));
        };
        self.pipeline.process_article_location(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility_index::FacilityIndex;
    use crate::store::MemoryArticleStore;
    use crate::testing::MockGeocoder;

    fn pipeline() -> Arc<LocationPipeline> {
        Arc::new(LocationPipeline::new(
            Arc::new(MemoryArticleStore::new()),
            Arc::new(MockGeocoder::new()),
            Arc::new(FacilityIndex::default()),
        ))
    }

    #[test]
    fn from_config_uses_batch_concurrency() {
        let config = LocatorConfig {
            batch_concurrency: 7,
            ..LocatorConfig::default()
        };
        let runner = BatchRunner::from_config(pipeline(), &config);
        assert_eq!(runner.concurrency, 7);
        assert!(runner.in_flight().is_empty());
    }

    #[test]
    fn zero_concurrency_still_makes_progress() {
        assert_eq!(BatchRunner::new(pipeline(), 0).concurrency, 1);
    }

    #[test]
    fn claim_is_exclusive_until_guard_drops() {
        let set = InFlightSet::new();
        let id = Uuid::new_v4();

        let guard = set.try_claim(id).unwrap();
        assert!(set.contains(id));
        assert!(set.try_claim(id).is_none());

        drop(guard);
        assert!(!set.contains(id));
        assert!(set.try_claim(id).is_some());
    }

    #[test]
    fn report_counts_each_outcome() {
        let mut report = BatchReport::new(Utc::now());
        report.record(Uuid::new_v4(), Ok(ProcessingOutcome::Skipped));
        report.record(Uuid::new_v4(), Ok(ProcessingOutcome::Defaulted { confidence: 0.1 }));
        report.record(
            Uuid::new_v4(),
            Ok(ProcessingOutcome::Resolved {
                tier: LocationTier::Facility,
                confidence: 0.8,
            }),
        );
        report.record(
            Uuid::new_v4(),
            Ok(ProcessingOutcome::Resolved {
                tier: LocationTier::Regional,
                confidence: 0.5,
            }),
        );
        let failed = Uuid::new_v4();
        report.record(failed, Err(LocatorError::ArticleNotFound(failed)));

        assert_eq!(report.total, 5);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.defaulted, 1);
        assert_eq!(report.resolved(), 2);
        assert_eq!(report.resolved_facility, 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].article_id, failed);
    }
}
