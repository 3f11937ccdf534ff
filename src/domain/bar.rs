//! Bar identifiers.
//!
//! A bar names one time step of a price panel. Panels are usually indexed by
//! integers (synthetic data) or calendar dates (daily quotes); free-form
//! labels are accepted for anything else.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bar {
    Index(i64),
    Date(NaiveDate),
    Label(String),
}

impl Bar {
    /// Parse `%Y-%m-%d` dates first, then integers; anything else is a label.
    ///
    /// Only canonical text becomes a date or an integer, so `"007"` stays a
    /// label and every bar displays back as the text it was parsed from.
    pub fn parse(text: &str) -> Bar {
        let trimmed = text.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            if date.format("%Y-%m-%d").to_string() == trimmed {
                return Bar::Date(date);
            }
        }
        if let Ok(index) = trimmed.parse::<i64>() {
            if index.to_string() == trimmed {
                return Bar::Index(index);
            }
        }
        Bar::Label(trimmed.to_string())
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Bar::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bar::Index(i) => write!(f, "{i}"),
            Bar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Bar::Label(s) => f.write_str(s),
        }
    }
}

impl FromStr for Bar {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Bar::parse(s))
    }
}

impl From<i64> for Bar {
    fn from(value: i64) -> Self {
        Bar::Index(value)
    }
}

impl From<NaiveDate> for Bar {
    fn from(value: NaiveDate) -> Self {
        Bar::Date(value)
    }
}

impl From<&str> for Bar {
    fn from(value: &str) -> Self {
        Bar::parse(value)
    }
}

impl Serialize for Bar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Bar::Index(i) => serializer.serialize_i64(*i),
            other => serializer.collect_str(other),
        }
    }
}
