use energymap_common::{Facility, LocationTier};

/// Location tier from the proximity match and the resolved district.
///
/// A facility match always wins; otherwise a non-blank district makes the
/// article regional; otherwise it is national.
pub fn classify(facility_match: Option<&Facility>, district: Option<&str>) -> LocationTier {
    if facility_match.is_some() {
        return LocationTier::Facility;
    }
    match district {
        Some(d) if !d.trim().is_empty() => LocationTier::Regional,
        _ => LocationTier::National,
    }
}
