use std::sync::OnceLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

fn stamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2})T(\d{2}-\d{2}-\d{2})").expect("static regex")
    })
}

/// Pulls the `YYYY-MM-DDZhh-mm-ss` acquisition stamp out of a granule file name.
///
/// `CAL_LID_L1-ValStage1-V3-01.2007-06-12T03-42-18ZN.hdf` gives
/// `2007-06-12Z03-42-18`.
pub fn granule_stamp(file_name: &str) -> Option<String> {
    let caps = stamp_pattern().captures(file_name)?;
    let (date, time) = (&caps[1], &caps[2]);
    NaiveDateTime::parse_from_str(&format!("{}T{}", date, time), "%Y-%m-%dT%H-%M-%S").ok()?;
    Some(format!("{}Z{}", date, time))
}

/// Decodes a `Profile_UTC_Time` value (`yymmdd.fraction_of_day`).
pub fn profile_datetime(value: f64) -> Option<NaiveDateTime> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let day = value.trunc() as i64;
    let fraction = value - value.trunc();
    let year = i32::try_from(day / 10_000).ok()?.checked_add(2000)?;
    let month = ((day / 100) % 100) as u32;
    let dom = (day % 100) as u32;
    let midnight = NaiveDate::from_ymd_opt(year, month, dom)?.and_hms_opt(0, 0, 0)?;
    let millis = (fraction * 86_400_000.0).round() as i64;
    midnight.checked_add_signed(Duration::milliseconds(millis))
}
