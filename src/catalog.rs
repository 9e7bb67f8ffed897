//! The nested catalog: series → years → shows.
//!
//! Field names follow the catalog JSON (`liveName`, `years`, `shows`, ...).
//! Everything except date and time slot is display data as far as the tiny
//! index is concerned; the legacy keys also fold in series and venue.

use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Full catalog in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    /// Series in document order.
    pub series: Vec<Series>,
}

/// One named series (tour) and its years.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// Series name.
    #[serde(rename = "liveName")]
    pub name: String,
    /// Display colour, unused by the codec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Years in document order.
    #[serde(default)]
    pub years: Vec<YearGroup>,
}

/// A year heading and the shows under it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearGroup {
    /// Display label, either `2024` or `"2024"` in the source.
    pub year: YearLabel,
    /// Shows in document order.
    #[serde(default)]
    pub shows: Vec<Show>,
}

/// Year label as written in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YearLabel {
    /// Numeric year.
    Number(i64),
    /// Free-form label.
    Text(String),
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearLabel::Number(n) => write!(f, "{}", n),
            YearLabel::Text(s) => f.write_str(s),
        }
    }
}

/// A single dated show as it appears in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    /// Calendar date, `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Matinee / evening marker.
    #[serde(default)]
    pub time: TimeSlot,
    /// Venue name.
    pub venue: String,
    /// Region, display only.
    #[serde(default)]
    pub prefecture: String,
}

/// Time slot of a show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "Option<String>")]
pub enum TimeSlot {
    /// Single show that day.
    #[default]
    None,
    /// Matinee.
    Am,
    /// Evening.
    Pm,
}

impl TimeSlot {
    /// Suffix used in the tiny key.
    pub fn letter(self) -> &'static str {
        match self {
            TimeSlot::None => "",
            TimeSlot::Am => "A",
            TimeSlot::Pm => "P",
        }
    }

    /// Label as written in the catalog.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::None => "",
            TimeSlot::Am => "AM",
            TimeSlot::Pm => "PM",
        }
    }
}

impl TryFrom<Option<String>> for TimeSlot {
    type Error = String;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(TimeSlot::None),
            Some("AM") => Ok(TimeSlot::Am),
            Some("PM") => Ok(TimeSlot::Pm),
            Some(other) => Err(format!("unknown time slot {:?}", other)),
        }
    }
}

impl From<TimeSlot> for Option<String> {
    fn from(slot: TimeSlot) -> Self {
        match slot {
            TimeSlot::None => None,
            other => Some(other.as_str().to_string()),
        }
    }
}

/// A show flattened out of the catalog, carrying its series and year.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogItem {
    /// Series name.
    pub series: String,
    /// Year label, display only.
    pub year: YearLabel,
    /// Calendar date.
    pub date: NaiveDate,
    /// Time slot.
    pub slot: TimeSlot,
    /// Venue.
    pub venue: String,
    /// Region, display only.
    pub prefecture: String,
}

impl CatalogItem {
    /// Date digits plus slot letter, e.g. `20240501P`.
    ///
    /// Ignores series and venue, so two shows on the same date and slot
    /// share a key.
    pub fn tiny_key(&self) -> String {
        format!("{}{}", self.date.format("%Y%m%d"), self.slot.letter())
    }

    /// Key over the full identity: series, date, venue and slot.
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.series,
            self.date,
            self.venue,
            self.slot.as_str()
        )
    }

    /// Normalized key used by legacy `#s=` / `#s0=` payloads.
    pub fn legacy_key(&self) -> String {
        [
            normalize(&self.series),
            self.date.to_string(),
            normalize(&self.venue),
            normalize(self.slot.as_str()),
        ]
        .join("|")
    }

    /// Decimal FNV-1a hash of the raw identity, the short id older share
    /// links carried in place of [`legacy_key`](Self::legacy_key).
    pub fn legacy_short_id(&self) -> String {
        fnv1a32(&self.identity_key()).to_string()
    }
}

impl Catalog {
    /// Parse catalog JSON.
    pub fn from_json_str(json: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Depth-first flatten in document order.
    pub fn flatten(&self) -> Vec<CatalogItem> {
        self.series
            .iter()
            .flat_map(|series| {
                series.years.iter().flat_map(move |year| {
                    year.shows.iter().map(move |show| CatalogItem {
                        series: series.name.clone(),
                        year: year.year.clone(),
                        date: show.date,
                        slot: show.time,
                        venue: show.venue.clone(),
                        prefecture: show.prefecture.clone(),
                    })
                })
            })
            .collect()
    }
}

/// Trim, collapse whitespace runs, fold curly apostrophes, uppercase.
pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{2019}', "'")
        .to_uppercase()
}

/// 32-bit FNV-1a over UTF-16 code units.
pub fn fnv1a32(s: &str) -> u32 {
    s.encode_utf16().fold(0x811c_9dc5u32, |h, unit| {
        (h ^ u32::from(unit)).wrapping_mul(0x0100_0193)
    })
}
