use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use energymap_common::{AdminArea, Coordinate, EnergyMapError, LocatorConfig};
use nominatim_client::{Address, NominatimClient, NominatimError, Place, SearchQuery};
use rand::Rng;
use tracing::{debug, warn};

use super::{GeocodeCandidate, GeocodeResult, Geocoder, RateLimiter};

/// Base backoff between retries. Actual delay is base * 2^attempt + jitter.
const RETRY_BASE: Duration = Duration::from_secs(2);

/// Request shaping and failure policy for [`NominatimGeocoder`].
#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub country_codes: Option<String>,
    pub language: Option<String>,
    pub contact_email: Option<String>,
    pub result_limit: u32,
    /// Longest a call waits for a limiter slot before giving up.
    pub acquire_timeout: Duration,
    /// Hard bound on a single HTTP exchange.
    pub request_timeout: Duration,
    /// 1 means no retry.
    pub max_attempts: u32,
    pub retry_base: Duration,
}

impl GeocoderSettings {
    pub fn from_config(config: &LocatorConfig) -> Self {
        Self {
            country_codes: config.country_codes.clone(),
            language: config.language.clone(),
            contact_email: config.contact_email.clone(),
            result_limit: config.result_limit,
            acquire_timeout: config.acquire_timeout,
            request_timeout: config.request_timeout,
            max_attempts: config.max_attempts.max(1),
            retry_base: RETRY_BASE,
        }
    }
}

/// [`Geocoder`] backed by a Nominatim search endpoint. Every request, retries
/// included, first takes a slot from the shared [`RateLimiter`].
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: NominatimClient,
    limiter: Arc<RateLimiter>,
    settings: GeocoderSettings,
}

impl NominatimGeocoder {
    pub fn new(
        client: NominatimClient,
        limiter: Arc<RateLimiter>,
        settings: GeocoderSettings,
    ) -> Self {
        Self {
            client,
            limiter,
            settings,
        }
    }

    /// Client, limiter and settings all derived from config.
    pub fn from_config(config: &LocatorConfig) -> Result<Self, EnergyMapError> {
        let client = NominatimClient::new(
            Some(&config.nominatim_url),
            &config.user_agent,
            config.request_timeout,
        )
        .map_err(|e| EnergyMapError::Config(format!("Cannot build geocoding client: {e}")))?;
        let limiter = Arc::new(RateLimiter::new(config.min_interval));
        Ok(Self::new(client, limiter, GeocoderSettings::from_config(config)))
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    fn query(&self, place: &str) -> SearchQuery {
        SearchQuery::new(place)
            .limit(self.settings.result_limit)
            .country_codes(self.settings.country_codes.clone())
            .language(self.settings.language.clone())
            .email(self.settings.contact_email.clone())
    }

    async fn search_once(&self, query: &SearchQuery) -> Result<Vec<Place>, NominatimError> {
        match tokio::time::timeout(self.settings.request_timeout, self.client.search(query)).await {
            Ok(result) => result,
            Err(_) => Err(NominatimError::Timeout),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, place: &str) -> GeocodeResult {
        let query = self.query(place);
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 0..max_attempts {
            if let Err(e) = self.limiter.acquire(self.settings.acquire_timeout).await {
                warn!(
                    place,
                    wait_ms = e.wait.as_millis() as u64,
                    "Geocoder rate limit wait exceeded"
                );
                return GeocodeResult::TransientError(e.to_string());
            }

            let err = match self.search_once(&query).await {
                Ok(places) => return candidate_from_places(place, places),
                Err(e) => e,
            };

            if err.is_retryable() && attempt + 1 < max_attempts {
                let backoff = retry_backoff(self.settings.retry_base, attempt);
                let jitter = Duration::from_millis(rand::rng().random_range(0..500));
                warn!(
                    place,
                    attempt = attempt + 1,
                    backoff_secs = backoff.as_secs(),
                    error = %err,
                    "Geocoding failed, retrying after backoff"
                );
                tokio::time::sleep(backoff.saturating_add(jitter)).await;
                continue;
            }

            warn!(place, error = %err, "Geocoding failed");
            return GeocodeResult::TransientError(err.to_string());
        }

        GeocodeResult::TransientError(format!("no geocoding attempt made for {place}"))
    }
}

/// `base * 2^attempt`, saturating instead of overflowing.
fn retry_backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// First ranked place with usable coordinates wins.
fn candidate_from_places(query: &str, places: Vec<Place>) -> GeocodeResult {
    if places.is_empty() {
        debug!(place = query, "No geocoding results");
        return GeocodeResult::NotFound;
    }

    let total = places.len();
    for p in places {
        let Some((lat, lng)) = p.coordinates() else {
            continue;
        };
        let coordinate = Coordinate::new(lat, lng);
        if !coordinate.is_valid() {
            continue;
        }

        let confidence = p
            .importance
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        let admin = p.address.as_ref().map(admin_area).unwrap_or_default();
        return GeocodeResult::Found(GeocodeCandidate {
            place: query.to_string(),
            coordinate,
            admin,
            confidence,
            display_name: Some(p.display_name),
        });
    }

    debug!(place = query, total, "Geocoding results had no usable coordinates");
    GeocodeResult::NotFound
}

/// Administrative triple from a decomposed address. Each level takes the
/// first non-blank key in its fallback chain.
pub fn admin_area(address: &Address) -> AdminArea {
    AdminArea {
        province: first_present(&[&address.state, &address.province, &address.region]),
        district: first_present(&[
            &address.city,
            &address.county,
            &address.city_district,
            &address.borough,
            &address.town,
            &address.municipality,
        ]),
        subdistrict: first_present(&[
            &address.suburb,
            &address.quarter,
            &address.neighbourhood,
            &address.village,
            &address.hamlet,
        ]),
    }
}

fn first_present(chain: &[&Option<String>]) -> Option<String> {
    chain
        .iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
