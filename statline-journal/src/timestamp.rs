//! Utilities to deal with journal timestamps.

use std::fmt;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A unix timestamp (full seconds elapsed since 1970-01-01 00:00 UTC).
///
/// Unlike a plain `u64`, this type can represent times before the epoch as
/// well as the [`INVALID`](Self::INVALID) sentinel produced by
/// [`parse`](Self::parse) for unreadable input.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UnixTimestamp(i64);

impl UnixTimestamp {
    /// The sentinel for timestamps that could not be interpreted.
    ///
    /// This is the smallest representable timestamp. It sorts before every
    /// staleness cutoff, so records carrying it are always rejected as stale
    /// and never uploaded.
    pub const INVALID: Self = Self(i64::MIN);

    /// Creates a unix timestamp from the given number of seconds.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Creates a unix timestamp from the given number of milliseconds.
    ///
    /// Milliseconds are floor-divided into full seconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.div_euclid(1000))
    }

    /// Creates a unix timestamp from the given system time.
    pub fn from_system(time: SystemTime) -> Self {
        match time.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(since_epoch) => Self(since_epoch.as_secs() as i64),
            Err(before_epoch) => Self(-(before_epoch.duration().as_secs() as i64)),
        }
    }

    /// Returns the current timestamp.
    #[inline]
    pub fn now() -> Self {
        Self::from_system(SystemTime::now())
    }

    /// Interprets a journal timestamp field.
    ///
    /// The rules, in order:
    ///
    ///  - An empty string is the current time.
    ///  - A string of exactly 10 ASCII digits is taken as unix **seconds**.
    ///  - A string of any other number of ASCII digits is taken as unix
    ///    **milliseconds** and floor-divided into seconds. Values that do not
    ///    fit an `i64` yield [`INVALID`](Self::INVALID).
    ///  - Anything else is parsed as date text (RFC 3339, then RFC 2822, then
    ///    common `"%Y-%m-%d %H:%M:%S"` shapes interpreted as UTC) and
    ///    converted to whole seconds. Unparseable text yields
    ///    [`INVALID`](Self::INVALID).
    ///
    /// The 10-digit rule is a compatibility quirk inherited from the journal
    /// format: a 10-digit millisecond value is misread as seconds. Downstream
    /// consumers depend on this exact behavior, so it must not change.
    ///
    /// # Example
    ///
    /// ```
    /// use statline_journal::UnixTimestamp;
    ///
    /// assert_eq!(
    ///     UnixTimestamp::parse("2015-01-01T12:34:56.789Z"),
    ///     UnixTimestamp::from_secs(1420115696),
    /// );
    /// ```
    pub fn parse(input: &str) -> Self {
        if input.is_empty() {
            return Self::now();
        }

        if input.bytes().all(|b| b.is_ascii_digit()) {
            let Ok(number) = input.parse::<i64>() else {
                return Self::INVALID;
            };

            return match input.len() {
                10 => Self::from_secs(number),
                _ => Self::from_millis(number),
            };
        }

        Self::parse_date_text(input).unwrap_or(Self::INVALID)
    }

    fn parse_date_text(input: &str) -> Option<Self> {
        if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
            return Some(Self(date_time.timestamp()));
        }

        if let Ok(date_time) = DateTime::parse_from_rfc2822(input) {
            return Some(Self(date_time.timestamp()));
        }

        for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
                return Some(Self(naive.and_utc().timestamp()));
            }
        }

        let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;
        Some(Self(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp()))
    }

    /// Returns the number of seconds since the UNIX epoch start.
    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Subtracts a duration, saturating at the representable minimum.
    pub fn saturating_sub(self, duration: Duration) -> Self {
        Self(self.0.saturating_sub_unsigned(duration.as_secs()))
    }
}

impl fmt::Debug for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixTimestamp({})", self.as_secs())
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_secs().fmt(f)
    }
}

impl Serialize for UnixTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.as_secs())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let secs = i64::deserialize(deserializer)?;
        Ok(Self::from_secs(secs))
    }
}
