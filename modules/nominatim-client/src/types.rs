use serde::{Deserialize, Deserializer, Serialize};

// --- Request types ---

/// Parameters for a free-form `/search` query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    pub q: String,
    pub format: &'static str,
    pub addressdetails: u8,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countrycodes: Option<String>,
    #[serde(rename = "accept-language", skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SearchQuery {
    /// A `jsonv2` query with address decomposition enabled.
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            format: "jsonv2",
            addressdetails: 1,
            limit: 1,
            countrycodes: None,
            accept_language: None,
            email: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn country_codes(mut self, codes: Option<String>) -> Self {
        self.countrycodes = codes;
        self
    }

    pub fn language(mut self, language: Option<String>) -> Self {
        self.accept_language = language;
        self
    }

    pub fn email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }
}

// --- Response types ---

/// A single ranked match from `/search?format=jsonv2`.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub place_id: Option<u64>,
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub importance: Option<f64>,
    pub place_rank: Option<u32>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

impl Place {
    /// Parsed `(lat, lon)`. `None` when either field is not a finite number.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat: f64 = self.lat.trim().parse().ok()?;
        let lon: f64 = self.lon.trim().parse().ok()?;
        if lat.is_finite() && lon.is_finite() {
            Some((lat, lon))
        } else {
            None
        }
    }
}

/// Decomposed address returned with `addressdetails=1`. Which keys appear
/// depends on the country and the place's rank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    pub state: Option<String>,
    pub province: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub city_district: Option<String>,
    pub borough: Option<String>,
    pub town: Option<String>,
    pub municipality: Option<String>,
    pub suburb: Option<String>,
    pub quarter: Option<String>,
    pub neighbourhood: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// Importance arrives as a number, occasionally as a numeric string.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(f64),
        Str(String),
    }

    Ok(match Option::<NumOrString>::deserialize(deserializer)? {
        Some(NumOrString::Num(n)) => Some(n),
        Some(NumOrString::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}
