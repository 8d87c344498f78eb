//! Timestamp helpers for request parameters and payloads.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Timelike, Utc};

/// Anything that can be pinned to UTC. Naive timestamps are taken as UTC.
pub trait IntoUtc {
    fn into_utc(self) -> DateTime<Utc>;
}

impl IntoUtc for DateTime<Utc> {
    fn into_utc(self) -> DateTime<Utc> {
        self
    }
}

impl IntoUtc for DateTime<FixedOffset> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoUtc for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        self.and_utc()
    }
}

/// Format as `YYYY-MM-DDTHH:MM:SSZ`, dropping sub-second precision.
pub fn isoify_datetime(dt: impl IntoUtc) -> String {
    let dt = dt.into_utc();
    let dt = dt.with_nanosecond(0).unwrap_or(dt);
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a timestamp as sent by the API. Offset-less values are UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|n| n.and_utc())
        .map_err(|e| Error::decode(format!("bad timestamp {:?}: {}", s, e)))
}

/// A `start`/`stop` window for history endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: impl IntoUtc, stop: impl IntoUtc) -> Self {
        Self {
            start: start.into_utc(),
            stop: stop.into_utc(),
        }
    }

    /// The hour ending at `stop`.
    pub fn last_hour(stop: impl IntoUtc) -> Self {
        let stop = stop.into_utc();
        Self {
            start: stop - chrono::Duration::hours(1),
            stop,
        }
    }

    pub fn builder() -> TimeRangeBuilder {
        TimeRangeBuilder::default()
    }
}

/// Builds a [`TimeRange`] from either spelling of each bound.
///
/// `after` is an alias of `start` and `before` an alias of `stop`; setting
/// both spellings of one bound is an error.
#[derive(Debug, Clone, Default)]
pub struct TimeRangeBuilder {
    start: Option<DateTime<Utc>>,
    stop: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
}

impl TimeRangeBuilder {
    pub fn start(mut self, dt: impl IntoUtc) -> Self {
        self.start = Some(dt.into_utc());
        self
    }

    pub fn after(mut self, dt: impl IntoUtc) -> Self {
        self.after = Some(dt.into_utc());
        self
    }

    pub fn stop(mut self, dt: impl IntoUtc) -> Self {
        self.stop = Some(dt.into_utc());
        self
    }

    pub fn before(mut self, dt: impl IntoUtc) -> Self {
        self.before = Some(dt.into_utc());
        self
    }

    pub fn build(self) -> Result<TimeRange> {
        let start = pick("start", self.start, "after", self.after)?;
        let stop = pick("stop", self.stop, "before", self.before)?;
        Ok(TimeRange { start, stop })
    }
}

fn pick(
    name: &str,
    value: Option<DateTime<Utc>>,
    alias: &str,
    alias_value: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>> {
    match (value, alias_value) {
        (Some(_), Some(_)) => Err(Error::validation(format!(
            "cannot pass both {:?} and {:?}",
            name, alias
        ))),
        (Some(v), None) | (None, Some(v)) => Ok(v),
        (None, None) => Err(Error::validation(format!(
            "{:?} (or {:?}) is required",
            name, alias
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn isoify_truncates_and_converts_to_utc() {
        let dt = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()
            + chrono::Duration::milliseconds(890);
        assert_eq!(isoify_datetime(dt), "2021-03-04T05:06:07Z");

        let offset = DateTime::parse_from_rfc3339("2021-03-04T07:06:07+02:00").unwrap();
        assert_eq!(isoify_datetime(offset), "2021-03-04T05:06:07Z");

        let naive = NaiveDateTime::parse_from_str("2021-03-04T05:06:07", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(isoify_datetime(naive), "2021-03-04T05:06:07Z");
    }

    #[test]
    fn parses_api_timestamps() {
        let a = parse_datetime("2021-01-02T03:04:05.678Z").unwrap();
        assert_eq!(a.timestamp(), 1609556645);
        let b = parse_datetime("2021-01-02T03:04:05.678").unwrap();
        assert_eq!(a, b);
        assert!(matches!(parse_datetime("yesterday"), Err(Error::Decode(_))));
    }

    #[test]
    fn aliases_resolve_and_conflict() {
        let t0 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2021, 1, 1, 1, 0, 0).unwrap();

        let r = TimeRange::builder().after(t0).before(t1).build().unwrap();
        assert_eq!(r, TimeRange::new(t0, t1));

        let err = TimeRange::builder().start(t0).after(t0).stop(t1).build().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(TimeRange::builder().start(t0).build().is_err());

        assert_eq!(TimeRange::last_hour(t1), TimeRange::new(t0, t1));
    }
}
