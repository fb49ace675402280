use std::ops::Range;

/// Index of the latitude closest to `lat`, or `None` for an empty track.
pub fn find_lat_index(lat: f64, latitudes: &[f64]) -> Option<usize> {
    latitudes
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_finite())
        .min_by(|(_, a), (_, b)| (*a - lat).abs().total_cmp(&(*b - lat).abs()))
        .map(|(idx, _)| idx)
}

/// Profiles whose latitude lies between `start_lat` and `end_lat`, both ends included.
///
/// Night granules run north to south and day granules south to north; the
/// window is the same either way.
pub fn latitude_window(latitudes: &[f64], start_lat: f64, end_lat: f64) -> Range<usize> {
    let (Some(a), Some(b)) = (
        find_lat_index(start_lat, latitudes),
        find_lat_index(end_lat, latitudes),
    ) else {
        return 0..0;
    };
    a.min(b)..a.max(b) + 1
}
