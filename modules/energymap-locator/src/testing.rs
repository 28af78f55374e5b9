// Test doubles for the locator pipeline.
//
// - MockGeocoder (Geocoder): HashMap-based place→result, records calls,
//   optionally paced through a shared RateLimiter
// - FlakyArticleStore (ArticleStore): MemoryArticleStore that can be told
//   to fail reads or writes
//
// Plus helpers for building candidates and articles near known facilities.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use energymap_common::{AdminArea, Article, Coordinate, LocationUpdate};
use tokio::time::Instant;
use uuid::Uuid;

use crate::geocoding::{GeocodeCandidate, GeocodeResult, Geocoder, RateLimiter};
use crate::store::{ArticleStore, MemoryArticleStore};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Dangjin coal/LNG complex, Chungcheongnam-do.
pub const DANGJIN_PLANT: (f64, f64) = (37.0556, 126.5106);
/// Taean coal plant.
pub const TAEAN_PLANT: (f64, f64) = (36.9081, 126.2350);
/// Gangnam-gu office, Seoul.
pub const GANGNAM: (f64, f64) = (37.5172, 127.0473);

/// Point `km` kilometers due north of `(lat, lng)`.
pub fn north_of((lat, lng): (f64, f64), km: f64) -> Coordinate {
    Coordinate::new(lat + (km / 6371.0).to_degrees(), lng)
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn candidate(
    place: &str,
    at: Coordinate,
    confidence: f64,
    district: Option<&str>,
) -> GeocodeCandidate {
    GeocodeCandidate {
        place: place.to_string(),
        coordinate: at,
        admin: AdminArea {
            province: Some("충청남도".to_string()),
            district: district.map(str::to_string),
            subdistrict: None,
        },
        confidence,
        display_name: None,
    }
}

pub fn found(
    place: &str,
    at: Coordinate,
    confidence: f64,
    district: Option<&str>,
) -> GeocodeResult {
    GeocodeResult::Found(candidate(place, at, confidence, district))
}

/// An article that already carries coordinates.
pub fn resolved_article(title: &str) -> Article {
    let mut article = Article::new(title, "");
    article.latitude = Some(DANGJIN_PLANT.0);
    article.longitude = Some(DANGJIN_PLANT.1);
    article
}

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

/// Place-name keyed geocoder. Unregistered places are `NotFound`.
#[derive(Default)]
pub struct MockGeocoder {
    results: HashMap<String, GeocodeResult>,
    calls: Mutex<Vec<(String, Instant)>>,
    limiter: Option<(Arc<RateLimiter>, Duration)>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, place: &str, result: GeocodeResult) -> Self {
        self.results.insert(place.to_string(), result);
        self
    }

    /// Take a limiter slot before answering, as the real geocoder does.
    pub fn limited(mut self, limiter: Arc<RateLimiter>, max_wait: Duration) -> Self {
        self.limiter = Some((limiter, max_wait));
        self
    }

    /// Places queried, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// When each query was answered.
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn resolve(&self, place: &str) -> GeocodeResult {
        if let Some((limiter, max_wait)) = &self.limiter {
            if let Err(e) = limiter.acquire(*max_wait).await {
                return GeocodeResult::TransientError(e.to_string());
            }
        }
        self.calls
            .lock()
            .unwrap()
            .push((place.to_string(), Instant::now()));
        self.results
            .get(place)
            .cloned()
            .unwrap_or(GeocodeResult::NotFound)
    }
}

// ---------------------------------------------------------------------------
// FlakyArticleStore
// ---------------------------------------------------------------------------

/// Wraps a [`MemoryArticleStore`] with switchable read and write failures.
pub struct FlakyArticleStore {
    inner: MemoryArticleStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyArticleStore {
    pub fn new(inner: MemoryArticleStore) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryArticleStore {
        &self.inner
    }
}

#[async_trait]
impl ArticleStore for FlakyArticleStore {
    async fn get(&self, id: Uuid) -> Result<Option<Article>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("connection reset while reading article {id}");
        }
        self.inner.get(id).await
    }

    async fn update_location(&self, id: Uuid, update: &LocationUpdate) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection reset while writing article {id}");
        }
        self.inner.update_location(id, update).await
    }

    async fn clear_location(&self, id: Uuid) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection reset while clearing article {id}");
        }
        self.inner.clear_location(id).await
    }
}
