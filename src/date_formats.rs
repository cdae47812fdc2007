use super::*;
use crate::js_regex::{Captures, Regex};
use std::sync::OnceLock;

const MONTH_NAMES_LONG: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

// Shared tail for both arrangements: optional clock time, optional zone
// word, optional numeric offset.
const TIME_AND_ZONE: &str = r"(?:\s+(?P<hour>\d{1,2}):(?P<minute>\d{2})(?::(?P<second>\d{2})(?:\.(?P<frac>\d{1,9}))?)?)?(?:\s*(?P<zone_word>utc|ut|gmt|z))?(?:\s*(?P<zone_sign>[+-])(?P<zone_hour>\d{1,2}):?(?P<zone_minute>\d{2}))?";

fn month_day_year_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(&format!(
                r"^(?P<month>[a-z]{{3,9}})\.?,?\s+(?P<day>\d{{1,2}}),?\s+(?P<year>\d{{1,6}}){TIME_AND_ZONE}$"
            ))
            .ok()
        })
        .as_ref()
}

fn day_month_year_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(&format!(
                r"^(?P<day>\d{{1,2}})\.?\s+(?P<month>[a-z]{{3,9}})\.?,?\s+(?P<year>\d{{1,6}}){TIME_AND_ZONE}$"
            ))
            .ok()
        })
        .as_ref()
}

pub(crate) fn parse_month_name_to_epoch_ms(src: &str) -> Option<i64> {
    let lowered = src.to_ascii_lowercase();
    for pattern in [month_day_year_pattern(), day_month_year_pattern()] {
        let Some(re) = pattern else { continue };
        if let Some(caps) = re.captures(&lowered).ok().flatten() {
            if let Some(timestamp_ms) = epoch_ms_from_captures(&caps) {
                return Some(timestamp_ms);
            }
        }
    }
    None
}

// Abbreviations resolve by prefix, so "sep", "sept" and "september" all
// name month 9.
pub(crate) fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 {
        return None;
    }
    MONTH_NAMES_LONG
        .iter()
        .position(|name| name.starts_with(token))
        .map(|idx| idx as u32 + 1)
}

fn epoch_ms_from_captures(caps: &Captures) -> Option<i64> {
    let month = month_from_name(caps.name("month")?)?;
    let day = caps.name("day")?.parse::<u32>().ok()?;
    let mut year = caps.name("year")?.parse::<i64>().ok()?;
    if (0..=99).contains(&year) {
        year += 1900;
    }
    if day == 0 || day > js_date::days_in_month(year, month) {
        return None;
    }

    let hour = capture_i64(caps, "hour").unwrap_or(0);
    let minute = capture_i64(caps, "minute").unwrap_or(0);
    let second = capture_i64(caps, "second").unwrap_or(0);
    let millisecond = match caps.name("frac") {
        Some(frac) => js_date::milliseconds_from_fraction(frac)?,
        None => 0,
    };
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    let mut offset_minutes = 0i64;
    if let (Some(sign), Some(zone_hour), Some(zone_minute)) = (
        caps.name("zone_sign"),
        capture_i64(caps, "zone_hour"),
        capture_i64(caps, "zone_minute"),
    ) {
        if zone_hour > 23 || zone_minute > 59 {
            return None;
        }
        let magnitude = zone_hour * 60 + zone_minute;
        offset_minutes = if sign == "-" { -magnitude } else { magnitude };
    }

    let timestamp_ms = js_date::utc_timestamp_ms_from_components(
        year,
        i64::from(month) - 1,
        i64::from(day),
        hour,
        minute,
        second,
        millisecond,
    );
    js_date::clip_to_date_range(timestamp_ms - offset_minutes * 60_000)
}

fn capture_i64(caps: &Captures, name: &str) -> Option<i64> {
    caps.name(name)?.parse::<i64>().ok()
}
