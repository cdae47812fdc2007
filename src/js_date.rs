use super::*;

pub fn parse_date_string_to_epoch_ms(src: &str) -> Option<i64> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    parse_iso_8601_to_epoch_ms(src).or_else(|| date_formats::parse_month_name_to_epoch_ms(src))
}

fn parse_iso_8601_to_epoch_ms(src: &str) -> Option<i64> {
    let bytes = src.as_bytes();
    let mut pos = 0usize;

    let mut sign = 1i64;
    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        if bytes[pos] == b'-' {
            sign = -1;
        }
        pos += 1;
    }

    let year_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos - year_start < 4 {
        return None;
    }
    let year = sign * src.get(year_start..pos)?.parse::<i64>().ok()?;
    // Years past the representable range are rejected before the civil
    // arithmetic runs.
    if !(-271_821..=275_760).contains(&year) {
        return None;
    }

    if bytes.get(pos) != Some(&b'-') {
        return None;
    }
    pos += 1;
    let month = parse_fixed_digits_i64(src, &mut pos, 2)?;
    if bytes.get(pos) != Some(&b'-') {
        return None;
    }
    pos += 1;
    let day = parse_fixed_digits_i64(src, &mut pos, 2)?;

    let month = u32::try_from(month).ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let day = u32::try_from(day).ok()?;
    if day == 0 || day > days_in_month(year, month) {
        return None;
    }

    let mut hour = 0i64;
    let mut minute = 0i64;
    let mut second = 0i64;
    let mut millisecond = 0i64;
    let mut offset_minutes = 0i64;

    if pos < bytes.len() {
        if bytes[pos] != b'T' && bytes[pos] != b' ' {
            return None;
        }
        pos += 1;

        hour = parse_fixed_digits_i64(src, &mut pos, 2)?;
        if bytes.get(pos) != Some(&b':') {
            return None;
        }
        pos += 1;
        minute = parse_fixed_digits_i64(src, &mut pos, 2)?;

        if bytes.get(pos) == Some(&b':') {
            pos += 1;
            second = parse_fixed_digits_i64(src, &mut pos, 2)?;
        }

        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            let frac_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == frac_start {
                return None;
            }
            millisecond = milliseconds_from_fraction(src.get(frac_start..pos)?)?;
        }

        if pos < bytes.len() {
            match bytes[pos] {
                b'Z' | b'z' => {
                    pos += 1;
                }
                b'+' | b'-' => {
                    let zone_sign = if bytes[pos] == b'+' { 1 } else { -1 };
                    pos += 1;
                    let zone_hour = parse_fixed_digits_i64(src, &mut pos, 2)?;
                    if bytes.get(pos) == Some(&b':') {
                        pos += 1;
                    }
                    let zone_minute = parse_fixed_digits_i64(src, &mut pos, 2)?;
                    if zone_hour > 23 || zone_minute > 59 {
                        return None;
                    }
                    offset_minutes = zone_sign * (zone_hour * 60 + zone_minute);
                }
                _ => return None,
            }
        }
    }

    if pos != bytes.len() {
        return None;
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    let timestamp_ms = utc_timestamp_ms_from_components(
        year,
        i64::from(month) - 1,
        i64::from(day),
        hour,
        minute,
        second,
        millisecond,
    );
    clip_to_date_range(timestamp_ms - offset_minutes * 60_000)
}

fn parse_fixed_digits_i64(src: &str, pos: &mut usize, width: usize) -> Option<i64> {
    let end = pos.checked_add(width)?;
    let segment = src.get(*pos..end)?;
    if !segment.as_bytes().iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    *pos = end;
    segment.parse::<i64>().ok()
}

// First three fractional digits are kept, shorter fractions are padded
// out to millisecond precision.
pub(crate) fn milliseconds_from_fraction(frac: &str) -> Option<i64> {
    let mut parsed = 0i64;
    let mut digits = 0usize;
    for ch in frac.chars().take(3) {
        parsed = parsed * 10 + i64::from(ch.to_digit(10)?);
        digits += 1;
    }
    while digits < 3 {
        parsed *= 10;
        digits += 1;
    }
    Some(parsed)
}

// Time values are representable within 100,000,000 days of the epoch.
const MAX_TIMESTAMP_MS: i64 = 8_640_000_000_000_000;

pub(crate) fn clip_to_date_range(timestamp_ms: i64) -> Option<i64> {
    if !(-MAX_TIMESTAMP_MS..=MAX_TIMESTAMP_MS).contains(&timestamp_ms) {
        return None;
    }
    Some(timestamp_ms)
}

pub fn format_iso_8601_utc(timestamp_ms: i64) -> String {
    let (year, month, day, hour, minute, second, millisecond) = date_components_utc(timestamp_ms);
    let year_str = if (0..=9999).contains(&year) {
        format!("{year:04}")
    } else if year < 0 {
        format!("-{:06}", -(year as i128))
    } else {
        format!("+{:06}", year)
    };
    format!(
        "{year_str}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}.{millisecond:03}Z"
    )
}

pub(crate) fn date_components_utc(timestamp_ms: i64) -> (i64, u32, u32, u32, u32, u32, u32) {
    let days = timestamp_ms.div_euclid(86_400_000);
    let rem = timestamp_ms.rem_euclid(86_400_000);
    let hour = (rem / 3_600_000) as u32;
    let minute = ((rem % 3_600_000) / 60_000) as u32;
    let second = ((rem % 60_000) / 1_000) as u32;
    let millisecond = (rem % 1_000) as u32;
    let (year, month, day) = civil_from_days(days);
    (year, month, day, hour, minute, second, millisecond)
}

pub(crate) fn utc_timestamp_ms_from_components(
    year: i64,
    month_zero_based: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
    millisecond: i64,
) -> i64 {
    let (norm_year, norm_month) = normalize_year_month(year, month_zero_based);
    let mut days = days_from_civil(norm_year, norm_month, 1).saturating_add(day - 1);
    let mut time_ms = ((hour * 60 + minute) * 60 + second) * 1_000 + millisecond;
    days = days.saturating_add(time_ms.div_euclid(86_400_000));
    time_ms = time_ms.rem_euclid(86_400_000);

    let out = (days as i128) * 86_400_000i128 + (time_ms as i128);
    out.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

pub(crate) fn normalize_year_month(year: i64, month_zero_based: i64) -> (i64, u32) {
    let total_month = year.saturating_mul(12).saturating_add(month_zero_based);
    let norm_year = total_month.div_euclid(12);
    let norm_month = total_month.rem_euclid(12) as u32 + 1;
    (norm_year, norm_month)
}

pub(crate) fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let adjusted_year = i128::from(year) - if month <= 2 { 1 } else { 0 };
    let era = adjusted_year.div_euclid(400);
    let yoe = adjusted_year - era * 400;
    let month = i128::from(month);
    let day = i128::from(day);
    let doy = (153 * (month + if month > 2 { -3 } else { 9 }) + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146_097 + doe - 719_468;
    days.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

pub(crate) fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096).div_euclid(365);
    let mut year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2).div_euclid(153);
    let day = (doy - (153 * mp + 2).div_euclid(5) + 1) as u32;
    let month = (mp + if mp < 10 { 3 } else { -9 }) as u32;
    if month <= 2 {
        year += 1;
    }
    (year, month, day)
}

pub(crate) fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

pub(crate) fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateComponents {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub millisecond: u32,
    pub weekday: u32,
}

impl DateComponents {
    pub fn from_epoch_ms(timestamp_ms: i64) -> Self {
        let (year, month, day, hour, minute, second, millisecond) =
            date_components_utc(timestamp_ms);
        let days = timestamp_ms.div_euclid(86_400_000);
        // 0 = Sunday; day 0 of the epoch was a Thursday.
        let weekday = ((days + 4).rem_euclid(7)) as u32;
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
            weekday,
        }
    }

    pub fn epoch_ms(&self) -> i64 {
        utc_timestamp_ms_from_components(
            self.year,
            i64::from(self.month) - 1,
            i64::from(self.day),
            i64::from(self.hour),
            i64::from(self.minute),
            i64::from(self.second),
            i64::from(self.millisecond),
        )
    }
}
