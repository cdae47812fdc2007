pub(crate) const SECOND_MS: i64 = 1_000;
pub(crate) const MINUTE_MS: i64 = 60 * SECOND_MS;
pub(crate) const HOUR_MS: i64 = 60 * MINUTE_MS;
pub(crate) const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiggestUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl BiggestUnit {
    pub const ALL: [Self; 4] = [Self::Days, Self::Hours, Self::Minutes, Self::Seconds];

    pub fn name(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.name().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    // Units above `biggest` stay zero; the biggest unit itself is not
    // capped, so 25 hours stays 25 hours.
    pub fn split(duration_ms: i64, biggest: BiggestUnit) -> Self {
        let mut left = duration_ms.max(0);
        let mut out = Self {
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        };
        if biggest == BiggestUnit::Days {
            out.days = left / DAY_MS;
            left %= DAY_MS;
        }
        if matches!(biggest, BiggestUnit::Days | BiggestUnit::Hours) {
            out.hours = left / HOUR_MS;
            left %= HOUR_MS;
        }
        if biggest != BiggestUnit::Seconds {
            out.minutes = left / MINUTE_MS;
            left %= MINUTE_MS;
        }
        out.seconds = left / SECOND_MS;
        out
    }

    pub fn until(target_epoch_ms: i64, now_ms: i64, biggest: BiggestUnit) -> Self {
        Self::split(target_epoch_ms.saturating_sub(now_ms), biggest)
    }
}
