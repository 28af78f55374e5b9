use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confidence written for articles that could not be resolved to any place.
pub const DEFAULT_CONFIDENCE: f64 = 0.1;

/// Lowest confidence a resolved article may carry. Keeps resolved articles
/// strictly above [`DEFAULT_CONFIDENCE`] even when the provider reports a
/// tiny or missing importance score.
pub const MIN_RESOLVED_CONFIDENCE: f64 = 0.11;

/// Default facility proximity radius.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Haversine great-circle distance between two coordinates in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1_r = a.lat.to_radians();
    let lat2_r = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Administrative hierarchy resolved for a place. Province is the top level
/// (도/광역시), district the city/county/gu level, subdistrict the dong/eup/myeon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminArea {
    pub province: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
}

impl AdminArea {
    pub fn is_empty(&self) -> bool {
        self.province.is_none() && self.district.is_none() && self.subdistrict.is_none()
    }
}

// --- Enums ---

/// How specific an article's location is. Ordered least to most specific.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LocationTier {
    National,
    Regional,
    Facility,
}

impl LocationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationTier::National => "national",
            LocationTier::Regional => "regional",
            LocationTier::Facility => "facility",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "national" => Some(LocationTier::National),
            "regional" => Some(LocationTier::Regional),
            "facility" => Some(LocationTier::Facility),
            _ => None,
        }
    }
}

impl std::fmt::Display for LocationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Records ---

/// A news article. Only the location fields are written by the locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub location_type: Option<LocationTier>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub subdistrict: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub facility_id: Option<Uuid>,
    pub confidence: Option<f64>,
}

impl Article {
    /// A fresh article with no location fields set.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            location_type: None,
            province: None,
            district: None,
            subdistrict: None,
            latitude: None,
            longitude: None,
            facility_id: None,
            confidence: None,
        }
    }

    /// Both coordinates present. Resolved articles are never reprocessed.
    pub fn is_resolved(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinate { lat, lng }),
            _ => None,
        }
    }

    /// Overwrite every location field from an update.
    pub fn apply(&mut self, update: &LocationUpdate) {
        self.location_type = Some(update.tier);
        self.confidence = Some(update.confidence);
        match &update.resolution {
            Some(res) => {
                self.province = res.admin.province.clone();
                self.district = res.admin.district.clone();
                self.subdistrict = res.admin.subdistrict.clone();
                self.latitude = Some(res.coordinate.lat);
                self.longitude = Some(res.coordinate.lng);
                self.facility_id = res.facility_id;
            }
            None => self.clear_place(),
        }
    }

    /// Drop every location field so the next run reprocesses the article.
    pub fn clear_location(&mut self) {
        self.location_type = None;
        self.confidence = None;
        self.clear_place();
    }

    fn clear_place(&mut self) {
        self.province = None;
        self.district = None;
        self.subdistrict = None;
        self.latitude = None;
        self.longitude = None;
        self.facility_id = None;
    }
}

/// A geo-tagged facility such as a power plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Facility {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// The place part of a resolved update. Coordinates and admin fields always
/// travel together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub coordinate: Coordinate,
    pub admin: AdminArea,
    pub facility_id: Option<Uuid>,
}

/// The full set of location fields written for one article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub tier: LocationTier,
    pub confidence: f64,
    pub resolution: Option<ResolvedPlace>,
}

impl LocationUpdate {
    /// National tier, sentinel confidence, nothing else.
    pub fn defaulted() -> Self {
        Self {
            tier: LocationTier::National,
            confidence: DEFAULT_CONFIDENCE,
            resolution: None,
        }
    }

    /// A geocoded result. `facility_id` is only kept for the facility tier.
    pub fn resolved(
        tier: LocationTier,
        raw_confidence: f64,
        coordinate: Coordinate,
        admin: AdminArea,
        facility_id: Option<Uuid>,
    ) -> Self {
        let facility_id = if tier == LocationTier::Facility {
            facility_id
        } else {
            None
        };
        Self {
            tier,
            confidence: resolved_confidence(raw_confidence),
            resolution: Some(ResolvedPlace {
                coordinate,
                admin,
                facility_id,
            }),
        }
    }
}

/// Clamp a raw provider score into the range a resolved article may carry.
pub fn resolved_confidence(raw: f64) -> f64 {
    if raw.is_nan() {
        return MIN_RESOLVED_CONFIDENCE;
    }
    raw.clamp(MIN_RESOLVED_CONFIDENCE, 1.0)
}

/// What a single pipeline run did to an article.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessingOutcome {
    Skipped,
    Resolved { tier: LocationTier, confidence: f64 },
    Defaulted { confidence: f64 },
}
