//! Calendar month, the time resolution of the explorer.
//!
//! Stored as months since January of year 0, so ordering and arithmetic are
//! plain integer operations. Years beyond [`MAX_YEAR`] saturate.

use std::cmp::min;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::config::MAX_YEAR;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(u16);

impl Month {
    pub const fn max_value() -> Month {
        Month(MAX_YEAR * 12 + 11)
    }

    /// Month containing `time`. BCE dates clamp to year 0, dates after
    /// [`MAX_YEAR`] clamp to that year.
    pub fn from_time_saturating(time: DateTime<Utc>) -> Month {
        let year = match time.year_ce() {
            (true, ce) => min(u32::from(MAX_YEAR), ce) as u16,
            (false, _) => 0,
        };
        Month(year * 12 + time.month0() as u16)
    }

    pub fn add_months_saturating(self, months: u16) -> Month {
        min(Month(self.0.saturating_add(months)), Month::max_value())
    }

    pub fn year(self) -> u16 {
        self.0 / 12
    }

    /// 1-based month of the year.
    pub fn month(self) -> u16 {
        self.0 % 12 + 1
    }
}

impl From<Month> for u16 {
    fn from(Month(month): Month) -> u16 {
        month
    }
}

impl TryFrom<u16> for Month {
    type Error = InvalidMonth;

    fn try_from(month: u16) -> Result<Month, InvalidMonth> {
        if month <= Month::max_value().0 {
            Ok(Month(month))
        } else {
            Err(InvalidMonth)
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}", self.year(), self.month())
    }
}

impl FromStr for Month {
    type Err = InvalidMonth;

    /// Accepts `YYYY` (January) or `YYYY/MM`.
    fn from_str(s: &str) -> Result<Month, InvalidMonth> {
        let (year, month) = match s.split_once('/') {
            Some((year, month)) => (year, Some(month)),
            None => (s, None),
        };

        let year: u16 = year.parse().map_err(|_| InvalidMonth)?;
        let month_plus_one: u16 = match month {
            Some(month) => month.parse().map_err(|_| InvalidMonth)?,
            None => 1,
        };

        if year <= MAX_YEAR && (1..=12).contains(&month_plus_one) {
            Ok(Month(year * 12 + month_plus_one - 1))
        } else {
            Err(InvalidMonth)
        }
    }
}

// Text formats see "YYYY/MM"; binary formats see the raw u16.

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u16(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            text.parse().map_err(de::Error::custom)
        } else {
            let raw = u16::deserialize(deserializer)?;
            Month::try_from(raw).map_err(de::Error::custom)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid month")]
pub struct InvalidMonth;
