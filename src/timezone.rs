//! Request-local timezone resolution.
//!
//! Identifiers are looked up in the bundled IANA database. Resolution never
//! touches process-wide state such as `TZ`, so concurrent requests asking
//! for different zones are independent.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

/// Zone used when an identifier is unknown.
pub const FALLBACK: Tz = Tz::UTC;

/// Calendar representations of a single instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    /// Local wall time, ISO-8601 without offset.
    pub iso_8601: String,
    /// UTC wall time, ISO-8601 without offset.
    pub utc: String,
    /// Local wall time followed by the zone abbreviation.
    pub local_time: String,
}

/// Look up an IANA identifier, falling back to [`FALLBACK`] when unknown.
pub fn resolve(identifier: &str) -> Tz {
    match identifier.parse::<Tz>() {
        Ok(tz) => tz,
        Err(err) => {
            tracing::debug!(
                timezone = identifier,
                error = %err,
                "unknown timezone, falling back to UTC"
            );
            FALLBACK
        },
    }
}

/// Format `instant` for `tz`.
pub fn format(instant: DateTime<Utc>, tz: Tz) -> Formatted {
    let local = instant.with_timezone(&tz);

    Formatted {
        iso_8601: iso_8601(&local.naive_local()),
        utc: iso_8601(&instant.naive_utc()),
        local_time: local.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
    }
}

/// Fractional seconds only appear when non-zero, at microsecond precision.
fn iso_8601(naive: &NaiveDateTime) -> String {
    let micros = naive.nanosecond() / 1_000 % 1_000_000;
    let base = naive.format("%Y-%m-%dT%H:%M:%S");

    if micros == 0 {
        base.to_string()
    } else {
        format!("{base}.{micros:06}")
    }
}
