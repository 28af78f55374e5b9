use energymap_common::{distance_km, Coordinate, Facility};

/// Nearest facility strictly closer than `radius_km` to `point`.
///
/// A facility exactly `radius_km` away does not match. Equal distances keep
/// the facility seen first.
pub fn nearest<'a>(
    point: Coordinate,
    facilities: &'a [Facility],
    radius_km: f64,
) -> Option<&'a Facility> {
    let mut best: Option<(&Facility, f64)> = None;

    for facility in facilities {
        let d = distance_km(point, facility.coordinate());
        if d.is_nan() || d >= radius_km {
            continue;
        }
        match best {
            Some((_, best_d)) if best_d <= d => {}
            _ => best = Some((facility, d)),
        }
    }

    best.map(|(f, _)| f)
}
