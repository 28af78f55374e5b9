//! Shared setup for locator integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use energymap_common::{Article, Facility};
use energymap_locator::facility_index::FacilityIndex;
use energymap_locator::store::{ArticleStore, MemoryArticleStore};
use energymap_locator::testing::MockGeocoder;
use energymap_locator::LocationPipeline;
use tracing_subscriber::EnvFilter;

/// Route pipeline logs to the test writer. `RUST_LOG=energymap_locator=debug`
/// shows stage transitions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct TestContext {
    pub store: Arc<MemoryArticleStore>,
    pub geocoder: Arc<MockGeocoder>,
    pub facilities: Vec<Facility>,
}

impl TestContext {
    pub fn new(articles: Vec<Article>, geocoder: MockGeocoder, facilities: Vec<Facility>) -> Self {
        init_tracing();
        Self {
            store: Arc::new(MemoryArticleStore::with_articles(articles)),
            geocoder: Arc::new(geocoder),
            facilities,
        }
    }

    pub fn pipeline(&self) -> LocationPipeline {
        self.pipeline_with_store(self.store.clone())
    }

    pub fn pipeline_with_store(&self, store: Arc<dyn ArticleStore>) -> LocationPipeline {
        LocationPipeline::new(
            store,
            self.geocoder.clone(),
            Arc::new(FacilityIndex::from_facilities(self.facilities.clone())),
        )
    }

    pub fn article(&self, id: uuid::Uuid) -> Article {
        self.store.snapshot(id).expect("article should exist")
    }
}
