//! Place-name resolution.
//!
//! [`Geocoder`] is the seam the pipeline talks to. Failures never surface as
//! errors: a place either resolves, is unknown to the provider, or failed
//! transiently, and the pipeline skips the latter two.

pub mod limiter;
pub mod nominatim;

pub use limiter::{RateLimitTimeout, RateLimiter};
pub use nominatim::{admin_area, GeocoderSettings, NominatimGeocoder};

use async_trait::async_trait;
use energymap_common::{AdminArea, Coordinate};

/// A successfully geocoded place name.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    /// The name that was queried, as extracted from the article.
    pub place: String,
    pub coordinate: Coordinate,
    pub admin: AdminArea,
    /// Provider relevance in [0, 1]. Higher is better; only used for ranking.
    pub confidence: f64,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeResult {
    Found(GeocodeCandidate),
    NotFound,
    /// Network failure, timeout, throttling, non-2xx or unreadable response.
    TransientError(String),
}

impl GeocodeResult {
    pub fn into_candidate(self) -> Option<GeocodeCandidate> {
        match self {
            GeocodeResult::Found(c) => Some(c),
            GeocodeResult::NotFound | GeocodeResult::TransientError(_) => None,
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, place: &str) -> GeocodeResult;
}
