//! Timezones for day windows and the report schedule

use std::fmt;

use thiserror::Error;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz, timezones};

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("Invalid timezone '{0}': expected an IANA name like Asia/Kolkata, UTC or an offset like +05:30")]
    Invalid(String),
}

/// Where local calendar days begin and end
#[derive(Clone, Copy)]
pub enum Zone {
    /// A constant UTC offset
    Fixed(UtcOffset),
    /// An IANA zone, daylight saving included
    Named(&'static Tz),
}

impl Zone {
    pub const UTC: Zone = Zone::Fixed(UtcOffset::UTC);

    /// Offset in effect at `instant`
    pub fn offset_at(&self, instant: OffsetDateTime) -> UtcOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Named(tz) => tz.get_offset_utc(&instant).to_utc(),
        }
    }

    /// `instant` expressed in local time
    pub fn to_local(&self, instant: OffsetDateTime) -> OffsetDateTime {
        instant.to_offset(self.offset_at(instant))
    }

    /// The instant a local wall-clock time refers to.
    ///
    /// A time repeated by a backward shift resolves to its first occurrence;
    /// a time skipped by a forward shift resolves to the moment after the
    /// shift.
    pub fn resolve(&self, local: PrimitiveDateTime) -> OffsetDateTime {
        let guess = self.offset_at(local.assume_utc());
        let first = local.assume_offset(guess);
        let actual = self.offset_at(first);
        if actual == guess {
            return self.earliest(local, first);
        }

        let second = local.assume_offset(actual);
        if self.offset_at(second) == actual {
            self.earliest(local, second)
        } else {
            // Gap: no offset reproduces this wall-clock time
            first.max(second)
        }
    }

    /// Prefer the earlier of two valid readings of an ambiguous local time
    fn earliest(&self, local: PrimitiveDateTime, found: OffsetDateTime) -> OffsetDateTime {
        let hour_earlier = found - time::Duration::hours(1);
        let before = self.offset_at(hour_earlier);
        if before == found.offset() {
            return found;
        }
        let other = local.assume_offset(before);
        if other < found && self.offset_at(other) == before {
            other
        } else {
            found
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::UTC
    }
}

impl PartialEq for Zone {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Zone::Fixed(a), Zone::Fixed(b)) => a == b,
            (Zone::Named(a), Zone::Named(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl Eq for Zone {}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Fixed(offset) if *offset == UtcOffset::UTC => f.write_str("UTC"),
            Zone::Fixed(offset) => write!(f, "{}", offset),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone({})", self)
    }
}

/// Parse an IANA name (`Asia/Kolkata`), `UTC`/`Z`, or a fixed offset such as
/// `+05:30`, `-0300`, `+02` or `UTC+01:00`
pub fn parse_timezone(value: &str) -> Result<Zone, ZoneError> {
    let trimmed = value.trim();
    let invalid = || ZoneError::Invalid(value.to_string());

    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(Zone::UTC);
    }

    if let Some(tz) = timezones::get_by_name(trimmed) {
        return Ok(Zone::Named(tz));
    }

    let body = trimmed
        .strip_prefix("UTC")
        .or_else(|| trimmed.strip_prefix("utc"))
        .unwrap_or(trimmed);

    let (sign, digits) = match body.chars().next() {
        Some('+') => (1i8, &body[1..]),
        Some('-') => (-1i8, &body[1..]),
        _ => return Err(invalid()),
    };

    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i8>().map_err(|_| invalid())?, 0i8),
        4 => (
            digits[..2].parse::<i8>().map_err(|_| invalid())?,
            digits[2..].parse::<i8>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };

    if minutes >= 60 {
        return Err(invalid());
    }

    UtcOffset::from_hms(sign * hours, sign * minutes, 0)
        .map(Zone::Fixed)
        .map_err(|_| invalid())
}
