//! Temporal values and the codec that moves them to and from text.
//!
//! Fields declared with a concrete chrono type parse into exactly that
//! type. A field declared as [`Temporal`] itself accepts any temporal value
//! and parses into the default concrete form, a zoned date-time.

use crate::core::{MapError, Result};
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use std::fmt;

/// Canonical textual form: ISO-8601 with seconds precision and a numeric offset.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
pub const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const ZONED_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

const LOCAL_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// Declared as the abstract [`Temporal`]; parses into [`TemporalKind::Zoned`].
    Any,
    Zoned,
    Utc,
    Local,
    Date,
}

impl TemporalKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "temporal",
            Self::Zoned => "datetime",
            Self::Utc => "datetime-utc",
            Self::Local => "datetime-local",
            Self::Date => "date",
        }
    }

    /// Concrete kind a parse produces for a field declared with this kind.
    pub fn concrete(&self) -> Self {
        match self {
            Self::Any => Self::Zoned,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temporal {
    Zoned(DateTime<FixedOffset>),
    Utc(DateTime<Utc>),
    Local(NaiveDateTime),
    Date(NaiveDate),
}

impl Temporal {
    pub fn kind(&self) -> TemporalKind {
        match self {
            Self::Zoned(_) => TemporalKind::Zoned,
            Self::Utc(_) => TemporalKind::Utc,
            Self::Local(_) => TemporalKind::Local,
            Self::Date(_) => TemporalKind::Date,
        }
    }

    /// The value as a zoned date-time; offset-less kinds are placed at `offset`.
    pub fn to_zoned(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        match self {
            Self::Zoned(dt) => *dt,
            Self::Utc(dt) => dt.fixed_offset(),
            Self::Local(naive) => localize(offset, *naive),
            Self::Date(date) => localize(offset, date.and_time(NaiveTime::MIN)),
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&CanonicalCodec::default().format(self))
    }
}

impl From<DateTime<FixedOffset>> for Temporal {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Zoned(value)
    }
}

impl From<DateTime<Utc>> for Temporal {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Utc(value)
    }
}

impl From<NaiveDateTime> for Temporal {
    fn from(value: NaiveDateTime) -> Self {
        Self::Local(value)
    }
}

impl From<NaiveDate> for Temporal {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

fn localize(offset: FixedOffset, naive: NaiveDateTime) -> DateTime<FixedOffset> {
    // a fixed offset has no gaps or folds, so the mapping is always single
    offset
        .from_local_datetime(&naive)
        .single()
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(naive - offset, offset))
}

/// Built-in text form used unless a mapped type overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalCodec {
    default_offset: FixedOffset,
}

impl Default for CanonicalCodec {
    fn default() -> Self {
        Self {
            default_offset: Utc.fix(),
        }
    }
}

impl CanonicalCodec {
    pub fn new(default_offset: FixedOffset) -> Self {
        Self { default_offset }
    }

    /// Offset applied to inputs that carry none; invalid offsets fall back to UTC.
    pub fn with_offset_seconds(seconds: i32) -> Self {
        Self::new(FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix()))
    }

    pub fn default_offset(&self) -> FixedOffset {
        self.default_offset
    }

    /// Parses `raw` into the concrete kind declared by `kind`.
    pub fn parse(&self, field: &str, raw: &str, kind: TemporalKind) -> Result<Temporal> {
        let zoned = self.parse_zoned(raw).ok_or_else(|| MapError::TemporalParse {
            field: field.to_string(),
            input: raw.to_string(),
            reason: format!("not a recognised {} value", kind.name()),
        })?;

        Ok(match kind.concrete() {
            TemporalKind::Utc => Temporal::Utc(zoned.with_timezone(&Utc)),
            TemporalKind::Local => Temporal::Local(zoned.naive_local()),
            TemporalKind::Date => Temporal::Date(zoned.date_naive()),
            TemporalKind::Zoned | TemporalKind::Any => Temporal::Zoned(zoned),
        })
    }

    pub fn format(&self, value: &Temporal) -> String {
        match value {
            Temporal::Zoned(dt) => dt.format(CANONICAL_FORMAT).to_string(),
            Temporal::Utc(dt) => dt.fixed_offset().format(CANONICAL_FORMAT).to_string(),
            Temporal::Local(naive) => naive.format(LOCAL_FORMAT).to_string(),
            Temporal::Date(date) => date.format(DATE_FORMAT).to_string(),
        }
    }

    fn parse_zoned(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let input = raw.trim();
        if input.is_empty() {
            return None;
        }

        if let Some(seconds) = input.strip_prefix('@') {
            let seconds = seconds.parse::<i64>().ok()?;
            return DateTime::<Utc>::from_timestamp(seconds, 0).map(|dt| dt.fixed_offset());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Some(dt);
        }

        for format in ZONED_INPUT_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(input, format) {
                return Some(dt);
            }
        }

        for format in LOCAL_INPUT_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
                return Some(localize(self.default_offset, naive));
            }
        }

        NaiveDate::parse_from_str(input, DATE_FORMAT)
            .ok()
            .map(|date| localize(self.default_offset, date.and_time(NaiveTime::MIN)))
    }
}

/// Per-type temporal policy.
///
/// Both hooks receive the field name (dotted path when formatting) so an
/// implementation can special-case individual fields and leave the rest to
/// the canonical codec.
pub trait TemporalCodec: Send + Sync {
    fn parse(
        &self,
        canonical: &CanonicalCodec,
        field: &str,
        raw: &str,
        kind: TemporalKind,
    ) -> Result<Temporal> {
        canonical.parse(field, raw, kind)
    }

    fn format(&self, canonical: &CanonicalCodec, _path: &str, value: &Temporal) -> String {
        canonical.format(value)
    }
}
