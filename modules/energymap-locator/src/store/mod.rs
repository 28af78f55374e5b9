// Storage seams for the locator.
//
// ArticleStore: read one article, write its location fields.
// FacilityStore: read-only snapshot of geo-tagged facilities.
//
// The pipeline only talks to these traits, so tests run against the
// in-memory implementations with no database.

pub mod memory;
pub mod postgres;

pub use memory::{MemoryArticleStore, MemoryFacilityStore};
pub use postgres::{PgArticleStore, PgFacilityStore};

use anyhow::{bail, Result};
use async_trait::async_trait;
use energymap_common::{Article, Facility, LocationUpdate, LocatorConfig};
use uuid::Uuid;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Article>>;

    /// Replace every location field of the article with `update`.
    async fn update_location(&self, id: Uuid, update: &LocationUpdate) -> Result<()>;

    /// Null out every location field so the next run reprocesses the article.
    async fn clear_location(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait FacilityStore: Send + Sync {
    /// Every facility that has both coordinates, in a stable order.
    async fn list_all_with_coordinates(&self) -> Result<Vec<Facility>>;
}

/// Postgres stores sharing one pool, from `DATABASE_URL`.
pub async fn connect_postgres(
    config: &LocatorConfig,
) -> Result<(PgArticleStore, PgFacilityStore)> {
    let Some(url) = config.database_url.as_deref() else {
        bail!("DATABASE_URL is not set");
    };
    let articles = PgArticleStore::connect(url).await?;
    let facilities = PgFacilityStore::new(articles.pool().clone());
    Ok((articles, facilities))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_postgres_requires_database_url() {
        let config = LocatorConfig {
            database_url: None,
            ..LocatorConfig::default()
        };
        let Err(err) = connect_postgres(&config).await else {
            panic!("expected an error without DATABASE_URL");
        };
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
