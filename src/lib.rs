use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

mod countdown;
mod date_formats;
mod js_date;
mod js_number;
mod js_regex;

pub use countdown::{BiggestUnit, TimeLeft};
pub use js_date::{DateComponents, format_iso_8601_utc, parse_date_string_to_epoch_ms};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UnknownAttribute {
        attribute: String,
    },
    InvalidDate {
        attribute: String,
        value: String,
    },
    MissingAttribute {
        candidates: Vec<String>,
    },
    Clock(String),
    Trace(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAttribute { attribute } => {
                write!(f, "unknown date attribute: {attribute}")
            }
            Self::InvalidDate { attribute, value } => {
                write!(f, "invalid date for {attribute}: {value}")
            }
            Self::MissingAttribute { candidates } => {
                write!(f, "one of attributes [{}] is required", candidates.join(", "))
            }
            Self::Clock(msg) => write!(f, "clock error: {msg}"),
            Self::Trace(msg) => write!(f, "trace error: {msg}"),
        }
    }
}

impl StdError for Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateAttr {
    Datetime,
    EndDate,
    TimeleftMs,
    TimestampMs,
    TimestampSeconds,
}

impl DateAttr {
    pub const ALL: [Self; 5] = [
        Self::Datetime,
        Self::EndDate,
        Self::TimeleftMs,
        Self::TimestampMs,
        Self::TimestampSeconds,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Datetime => "datetime",
            Self::EndDate => "end-date",
            Self::TimeleftMs => "timeleft-ms",
            Self::TimestampMs => "timestamp-ms",
            Self::TimestampSeconds => "timestamp-seconds",
        }
    }

    // Wire names are matched exactly; DOM case folding happens in
    // `Element`, not here.
    pub fn lookup(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|attr| attr.name() == name)
            .ok_or_else(|| Error::UnknownAttribute {
                attribute: name.to_string(),
            })
    }

    pub fn parse(self, raw: &str, now_ms: i64) -> Result<f64> {
        match self {
            Self::Datetime | Self::EndDate => match js_date::parse_date_string_to_epoch_ms(raw) {
                Some(timestamp_ms) => Ok(timestamp_ms as f64),
                None => Err(Error::InvalidDate {
                    attribute: self.name().to_string(),
                    value: raw.to_string(),
                }),
            },
            Self::TimeleftMs => Ok(now_ms as f64 + js_number::parse_js_number_from_string(raw)),
            Self::TimestampMs => Ok(js_number::parse_js_number_from_string(raw)),
            Self::TimestampSeconds => Ok(1_000.0 * js_number::parse_js_number_from_string(raw)),
        }
    }
}

pub trait AttributeSource {
    fn get(&self, name: &str) -> Option<String>;
}

impl AttributeSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl AttributeSource for Element {
    fn get(&self, name: &str) -> Option<String> {
        self.attr(name)
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    tag_name: String,
    attrs: HashMap<String, String>,
}

impl Element {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_lowercase(),
            attrs: HashMap::new(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.remove(&name.to_ascii_lowercase());
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.attrs.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(&name.to_ascii_lowercase())
    }
}

fn system_now_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(err) => -i64::try_from(err.duration().as_millis()).unwrap_or(i64::MAX),
    }
}

#[derive(Debug, Clone, Copy)]
enum ClockMode {
    System,
    Fixed(i64),
}

pub struct Resolver {
    clock: ClockMode,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            clock: ClockMode::System,
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        }
    }

    pub fn fixed(now_ms: i64) -> Self {
        let mut resolver = Self::new();
        resolver.clock = ClockMode::Fixed(now_ms);
        resolver
    }

    pub fn now_ms(&self) -> i64 {
        match self.clock {
            ClockMode::System => system_now_ms(),
            ClockMode::Fixed(now_ms) => now_ms,
        }
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        let ClockMode::Fixed(from) = self.clock else {
            return Err(Error::Clock("advance_time requires a fixed clock".into()));
        };
        if delta_ms < 0 {
            return Err(Error::Clock(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let to = from.saturating_add(delta_ms);
        self.clock = ClockMode::Fixed(to);
        self.trace_line(format!(
            "[clock] advance delta_ms={delta_ms} from={from} to={to}"
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        let ClockMode::Fixed(from) = self.clock else {
            return Err(Error::Clock(
                "advance_time_to requires a fixed clock".into(),
            ));
        };
        if target_ms < from {
            return Err(Error::Clock(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={from})"
            )));
        }
        self.clock = ClockMode::Fixed(target_ms);
        self.trace_line(format!("[clock] advance_to from={from} to={target_ms}"));
        Ok(())
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Trace(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub fn resolve_epoch(
        &mut self,
        source: &impl AttributeSource,
        names: &[&str],
    ) -> Result<Option<f64>> {
        let now_ms = self.now_ms();
        self.resolve_epoch_with_now(source, names, now_ms)
    }

    pub fn parse_date_attrs(
        &mut self,
        source: &impl AttributeSource,
        names: &[&str],
    ) -> Result<f64> {
        let now_ms = self.now_ms();
        self.parse_date_attrs_with_now(source, names, now_ms)
    }

    fn resolve_epoch_with_now(
        &mut self,
        source: &impl AttributeSource,
        names: &[&str],
        now_ms: i64,
    ) -> Result<Option<f64>> {
        // Every candidate is validated before any attribute is read, so
        // an unknown name fails even when an earlier candidate matches.
        let mut attrs = Vec::with_capacity(names.len());
        for name in names {
            attrs.push(DateAttr::lookup(name)?);
        }

        for attr in attrs {
            let Some(value) = source.get(attr.name()) else {
                continue;
            };
            if value.is_empty() {
                self.trace_line(format!("[resolve] attr={} skipped empty", attr.name()));
                continue;
            }
            let epoch_ms = attr.parse(&value, now_ms)?;
            self.trace_line(format!(
                "[resolve] attr={} value={} epoch_ms={}",
                attr.name(),
                value,
                js_number::format_number_default(epoch_ms)
            ));
            return Ok(Some(epoch_ms));
        }

        self.trace_line(format!(
            "[resolve] no candidate present candidates=[{}]",
            names.join(", ")
        ));
        Ok(None)
    }

    fn parse_date_attrs_with_now(
        &mut self,
        source: &impl AttributeSource,
        names: &[&str],
        now_ms: i64,
    ) -> Result<f64> {
        let epoch_ms = self
            .resolve_epoch_with_now(source, names, now_ms)?
            .ok_or_else(|| Error::MissingAttribute {
                candidates: names.iter().map(|name| name.to_string()).collect(),
            })?;

        let offset_seconds = offset_seconds_from_source(source);
        let adjusted_ms = epoch_ms + offset_seconds * 1_000.0;
        if offset_seconds != 0.0 {
            self.trace_line(format!(
                "[offset] seconds={} epoch_ms={}",
                js_number::format_number_default(offset_seconds),
                js_number::format_number_default(adjusted_ms)
            ));
        }
        Ok(adjusted_ms)
    }

    fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_stderr {
                eprintln!("{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.remove(0);
            }
            self.trace_logs.push(line);
        }
    }
}

// Absent, empty and NaN-coercing offsets all contribute nothing.
fn offset_seconds_from_source(source: &impl AttributeSource) -> f64 {
    let Some(raw) = source.get("offset-seconds") else {
        return 0.0;
    };
    if raw.is_empty() {
        return 0.0;
    }
    let seconds = js_number::parse_js_number_from_string(&raw);
    if seconds.is_nan() { 0.0 } else { seconds }
}

pub fn resolve_epoch(source: &impl AttributeSource, names: &[&str]) -> Result<Option<f64>> {
    let mut resolver = Resolver::new();
    resolver.resolve_epoch(source, names)
}

pub fn parse_date_attrs(source: &impl AttributeSource, names: &[&str]) -> Result<f64> {
    let mut resolver = Resolver::new();
    resolver.parse_date_attrs(source, names)
}

pub fn resolve_epoch_at(
    source: &impl AttributeSource,
    names: &[&str],
    now_ms: i64,
) -> Result<Option<f64>> {
    let mut resolver = Resolver::fixed(now_ms);
    resolver.resolve_epoch(source, names)
}

pub fn parse_date_attrs_at(
    source: &impl AttributeSource,
    names: &[&str],
    now_ms: i64,
) -> Result<f64> {
    let mut resolver = Resolver::fixed(now_ms);
    resolver.parse_date_attrs(source, names)
}
