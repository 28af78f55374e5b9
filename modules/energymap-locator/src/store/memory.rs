use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use energymap_common::{Article, Facility, LocationUpdate};
use uuid::Uuid;

use super::{ArticleStore, FacilityStore};

/// In-memory article table. Counts writes so callers can assert on them.
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: RwLock<HashMap<Uuid, Article>>,
    writes: AtomicUsize,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(articles: impl IntoIterator<Item = Article>) -> Self {
        let store = Self::new();
        for article in articles {
            store.insert(article);
        }
        store
    }

    pub fn insert(&self, article: Article) {
        self.articles
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(article.id, article);
    }

    /// Current copy of an article, bypassing the async trait.
    pub fn snapshot(&self, id: Uuid) -> Option<Article> {
        self.articles
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&id)
            .cloned()
    }

    /// Number of successful `update_location` / `clear_location` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut Article)) -> Result<()> {
        let mut articles = self
            .articles
            .write()
            .map_err(|_| anyhow!("article store lock poisoned"))?;
        let Some(article) = articles.get_mut(&id) else {
            bail!("article {id} not found");
        };
        f(article);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn get(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self.snapshot(id))
    }

    async fn update_location(&self, id: Uuid, update: &LocationUpdate) -> Result<()> {
        self.modify(id, |article| article.apply(update))
    }

    async fn clear_location(&self, id: Uuid) -> Result<()> {
        self.modify(id, Article::clear_location)
    }
}

/// Fixed facility list, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryFacilityStore {
    facilities: Vec<Facility>,
}

impl MemoryFacilityStore {
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self { facilities }
    }
}

#[async_trait]
impl FacilityStore for MemoryFacilityStore {
    async fn list_all_with_coordinates(&self) -> Result<Vec<Facility>> {
        Ok(self.facilities.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use energymap_common::{AdminArea, Coordinate, LocationTier};

    #[tokio::test]
    async fn update_replaces_location_fields_and_counts_write() {
        let article = Article::new("당진 LNG", "본문");
        let id = article.id;
        let store = MemoryArticleStore::with_articles([article]);

        let update = LocationUpdate::resolved(
            LocationTier::Regional,
            0.6,
            Coordinate::new(36.89, 126.64),
            AdminArea {
                province: Some("충청남도".into()),
                district: Some("당진시".into()),
                subdistrict: None,
            },
            None,
        );
        store.update_location(id, &update).await.unwrap();

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.location_type, Some(LocationTier::Regional));
        assert_eq!(stored.latitude, Some(36.89));
        assert_eq!(stored.district.as_deref(), Some("당진시"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn clear_location_makes_article_unresolved() {
        let mut article = Article::new("t", "b");
        article.latitude = Some(1.0);
        article.longitude = Some(2.0);
        let id = article.id;
        let store = MemoryArticleStore::with_articles([article]);

        store.clear_location(id).await.unwrap();
        assert!(!store.snapshot(id).unwrap().is_resolved());
    }

    #[tokio::test]
    async fn writing_unknown_article_fails_without_counting() {
        let store = MemoryArticleStore::new();
        let result = store
            .update_location(Uuid::new_v4(), &LocationUpdate::defaulted())
            .await;
        assert!(result.is_err());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn missing_article_reads_as_none() {
        let store = MemoryArticleStore::new();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }
}
