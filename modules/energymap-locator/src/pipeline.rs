//! Per-article location pipeline.
//!
//! Unresolved → Extracting → Geocoding → Matching → Classifying → Persisted,
//! or Skipped when the article already has coordinates. Nothing is written
//! until the final step, so dropping the future at any await point leaves
//! the article unresolved and safe to retry.

use std::sync::Arc;

use energymap_common::{
    EnergyMapError, LocationUpdate, LocatorConfig, ProcessingOutcome, DEFAULT_RADIUS_KM,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classifier::classify;
use crate::error::LocatorError;
use crate::extractor::{article_text, GazetteerExtractor, LocationExtractor};
use crate::facility_index::FacilityIndex;
use crate::gazetteer::Gazetteer;
use crate::geocoding::{GeocodeCandidate, GeocodeResult, Geocoder, NominatimGeocoder};
use crate::proximity::nearest;
use crate::store::ArticleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Unresolved,
    Extracting,
    Geocoding,
    Matching,
    Classifying,
    Persisted,
    Skipped,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Unresolved => write!(f, "unresolved"),
            Stage::Extracting => write!(f, "extracting"),
            Stage::Geocoding => write!(f, "geocoding"),
            Stage::Matching => write!(f, "matching"),
            Stage::Classifying => write!(f, "classifying"),
            Stage::Persisted => write!(f, "persisted"),
            Stage::Skipped => write!(f, "skipped"),
        }
    }
}

fn enter(article_id: Uuid, stage: Stage) {
    debug!(article_id = %article_id, stage = %stage, "Pipeline stage");
}

pub struct LocationPipeline {
    articles: Arc<dyn ArticleStore>,
    geocoder: Arc<dyn Geocoder>,
    extractor: Arc<dyn LocationExtractor>,
    facilities: Arc<FacilityIndex>,
    radius_km: f64,
}

impl LocationPipeline {
    /// Uses the built-in gazetteer and the default 10 km radius.
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        geocoder: Arc<dyn Geocoder>,
        facilities: Arc<FacilityIndex>,
    ) -> Self {
        Self {
            articles,
            geocoder,
            extractor: Arc::new(GazetteerExtractor::default()),
            facilities,
            radius_km: DEFAULT_RADIUS_KM,
        }
    }

    /// Nominatim geocoder, gazetteer and radius all taken from `config`.
    pub fn from_config(
        config: &LocatorConfig,
        articles: Arc<dyn ArticleStore>,
        facilities: Arc<FacilityIndex>,
    ) -> Result<Self, EnergyMapError> {
        let geocoder = NominatimGeocoder::from_config(config)?;
        let gazetteer = match &config.gazetteer_path {
            Some(path) => Gazetteer::from_path(path)?,
            None => Gazetteer::builtin(),
        };
        info!(
            gazetteer_entries = gazetteer.len(),
            facilities = facilities.len(),
            radius_km = config.radius_km,
            "Location pipeline configured"
        );
        Ok(Self::new(articles, Arc::new(geocoder), facilities)
            .with_extractor(Arc::new(GazetteerExtractor::new(gazetteer)))
            .with_radius_km(config.radius_km))
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn LocationExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    /// Resolve and persist one article's location.
    ///
    /// Geocoding failures only drop candidates. Errors are limited to loading
    /// the article and writing the result; on either the article is left as
    /// it was.
    pub async fn process_article_location(
        &self,
        id: Uuid,
    ) -> Result<ProcessingOutcome, LocatorError> {
        enter(id, Stage::Unresolved);
        let article = self
            .articles
            .get(id)
            .await
            .map_err(|e| LocatorError::Load {
                id,
                message: e.to_string(),
            })?
            .ok_or(LocatorError::ArticleNotFound(id))?;

        if article.is_resolved() {
            enter(id, Stage::Skipped);
            debug!(article_id = %id, "Article already resolved, skipping");
            return Ok(ProcessingOutcome::Skipped);
        }

        enter(id, Stage::Extracting);
        let places = self.extractor.extract(&article_text(&article.title, &article.body));
        if places.is_empty() {
            debug!(article_id = %id, "No gazetteer matches");
            return self.persist_default(id).await;
        }

        enter(id, Stage::Geocoding);
        let candidates = self.geocode_all(id, &places).await;
        let Some(best) = select_best(candidates) else {
            info!(article_id = %id, places = places.len(), "No place could be geocoded");
            return self.persist_default(id).await;
        };

        enter(id, Stage::Matching);
        let facility = nearest(best.coordinate, self.facilities.facilities(), self.radius_km);

        enter(id, Stage::Classifying);
        let tier = classify(facility, best.admin.district.as_deref());

        let update = LocationUpdate::resolved(
            tier,
            best.confidence,
            best.coordinate,
            best.admin.clone(),
            facility.map(|f| f.id),
        );
        self.persist(id, &update).await?;

        info!(
            article_id = %id,
            tier = %tier,
            confidence = update.confidence,
            place = best.place.as_str(),
            facility = facility.map(|f| f.name.as_str()).unwrap_or("-"),
            "Article location resolved"
        );
        Ok(ProcessingOutcome::Resolved {
            tier,
            confidence: update.confidence,
        })
    }

    /// Geocode each place in order, one at a time. Only `Found` results survive.
    async fn geocode_all(&self, id: Uuid, places: &[String]) -> Vec<GeocodeCandidate> {
        let mut candidates = Vec::with_capacity(places.len());
        for place in places {
            match self.geocoder.resolve(place).await {
                GeocodeResult::Found(c) => {
                    debug!(
                        article_id = %id,
                        place = place.as_str(),
                        confidence = c.confidence,
                        "Place geocoded"
                    );
                    candidates.push(c);
                }
                GeocodeResult::NotFound => {
                    debug!(article_id = %id, place = place.as_str(), "Place not found by geocoder");
                }
                GeocodeResult::TransientError(e) => {
                    warn!(
                        article_id = %id,
                        place = place.as_str(),
                        error = e.as_str(),
                        "Skipping place after geocoding error"
                    );
                }
            }
        }
        candidates
    }

    async fn persist_default(&self, id: Uuid) -> Result<ProcessingOutcome, LocatorError> {
        let update = LocationUpdate::defaulted();
        self.persist(id, &update).await?;
        info!(
            article_id = %id,
            confidence = update.confidence,
            "Article location defaulted to national"
        );
        Ok(ProcessingOutcome::Defaulted {
            confidence: update.confidence,
        })
    }

    async fn persist(&self, id: Uuid, update: &LocationUpdate) -> Result<(), LocatorError> {
        match self.articles.update_location(id, update).await {
            Ok(()) => {
                enter(id, Stage::Persisted);
                Ok(())
            }
            Err(e) => {
                warn!(article_id = %id, error = %e, "Failed to persist article location");
                Err(LocatorError::Persistence {
                    id,
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Highest confidence wins; exact ties keep the earliest candidate. A NaN
/// score ranks below everything.
pub fn select_best(candidates: Vec<GeocodeCandidate>) -> Option<GeocodeCandidate> {
    fn score(c: &GeocodeCandidate) -> f64 {
        if c.confidence.is_nan() {
            f64::NEG_INFINITY
        } else {
            c.confidence
        }
    }

    let mut best: Option<GeocodeCandidate> = None;
    for c in candidates {
        match &best {
            Some(b) if score(b) >= score(&c) => {}
            _ => best = Some(c),
        }
    }
    best
}
