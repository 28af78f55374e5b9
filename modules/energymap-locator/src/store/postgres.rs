//! Postgres-backed stores.
//!
//! Expected columns (owned by the surrounding application):
//!
//! ```sql
//! articles(id uuid primary key, title text not null, content text,
//!          location_type text, province text, district text, subdistrict text,
//!          latitude double precision, longitude double precision,
//!          facility_id uuid, location_confidence double precision)
//! facilities(id uuid primary key, name text not null,
//!            latitude double precision, longitude double precision,
//!            created_at timestamptz not null default now())
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use energymap_common::{Article, Facility, LocationTier, LocationUpdate};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use super::{ArticleStore, FacilityStore};

type ArticleRow = (
    Uuid,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    Option<Uuid>,
    Option<f64>,
);

#[derive(Clone)]
pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn get(&self, id: Uuid) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, content, location_type, province, district, subdistrict,
                   latitude, longitude, facility_id, location_confidence
            FROM articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(article_from_row))
    }

    async fn update_location(&self, id: Uuid, update: &LocationUpdate) -> Result<()> {
        let place = update.resolution.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET location_type = $2,
                location_confidence = $3,
                province = $4,
                district = $5,
                subdistrict = $6,
                latitude = $7,
                longitude = $8,
                facility_id = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.tier.as_str())
        .bind(update.confidence)
        .bind(place.and_then(|p| p.admin.province.clone()))
        .bind(place.and_then(|p| p.admin.district.clone()))
        .bind(place.and_then(|p| p.admin.subdistrict.clone()))
        .bind(place.map(|p| p.coordinate.lat))
        .bind(place.map(|p| p.coordinate.lng))
        .bind(place.and_then(|p| p.facility_id))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("article {id} not found");
        }
        Ok(())
    }

    async fn clear_location(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET location_type = NULL, location_confidence = NULL,
                province = NULL, district = NULL, subdistrict = NULL,
                latitude = NULL, longitude = NULL, facility_id = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("article {id} not found");
        }
        Ok(())
    }
}

fn article_from_row(r: ArticleRow) -> Article {
    let location_type = r.3.as_deref().and_then(|raw| {
        let tier = LocationTier::parse(raw);
        if tier.is_none() {
            warn!(article_id = %r.0, location_type = raw, "Unknown location_type in store");
        }
        tier
    });

    Article {
        id: r.0,
        title: r.1,
        body: r.2.unwrap_or_default(),
        location_type,
        province: r.4,
        district: r.5,
        subdistrict: r.6,
        latitude: r.7,
        longitude: r.8,
        facility_id: r.9,
        confidence: r.10,
    }
}

#[derive(Clone)]
pub struct PgFacilityStore {
    pool: PgPool,
}

impl PgFacilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FacilityStore for PgFacilityStore {
    async fn list_all_with_coordinates(&self) -> Result<Vec<Facility>> {
        let rows = sqlx::query_as::<_, (Uuid, String, f64, f64)>(
            r#"
            SELECT id, name, latitude, longitude
            FROM facilities
            WHERE latitude IS NOT NULL AND longitude IS NOT NULL
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Facility {
                id: r.0,
                name: r.1,
                latitude: r.2,
                longitude: r.3,
            })
            .collect())
    }
}
