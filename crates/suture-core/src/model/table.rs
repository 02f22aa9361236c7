//! Loose tabular input model.
//!
//! The upload/decoding collaborator hands the pipeline two tables of rows with
//! named fields. Nothing about those tables is statically fixed: columns may be
//! absent, misnamed, or typed differently across export versions, so every
//! value is a [`Cell`] and every access is a lenient coercion that answers
//! `None` instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// One scalar value from a decoded export.
///
/// Deserialization is untagged, so JSON rows coming from the decoding
/// collaborator map naturally: `null` → `Null`, numbers → `Number`, RFC 3339
/// strings → `Timestamp`, all other strings → `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl Cell {
    /// Text view of the cell. Numbers and timestamps render to their canonical
    /// string forms; blank text counts as absent.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Number(n) => Some(format_number(*n)),
            Self::Timestamp(ts) => Some(ts.to_rfc3339()),
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    /// Numeric view of the cell. Numeric text parses; anything else is absent.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Timestamp view of the cell. Text parses leniently via
    /// [`parse_timestamp`]; numbers never coerce (spreadsheet serial dates are
    /// the decoder's problem, not ours).
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// True for `Null` and for blank text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Parse a timestamp the way the exports actually write them.
///
/// Accepted forms, tried in order:
/// - RFC 3339 with offset (normalized to UTC),
/// - naive `YYYY-MM-DD[T or space]HH:MM[:SS[.frac]]` read as UTC (the exports
///   carry zone-less wall-clock stamps),
/// - bare `YYYY-MM-DD` (midnight UTC).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn format_number(n: f64) -> String {
    // Keys exported as numeric cells should read back as "1234", not "1234.0".
    if n.fract() == 0.0 && n.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let as_int = n as i64;
        as_int.to_string()
    } else {
        n.to_string()
    }
}

// ---------------------------------------------------------------------------
// RawRow / RawTable
// ---------------------------------------------------------------------------

/// One row of named cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    cells: BTreeMap<String, Cell>,
}

impl RawRow {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    /// Insert a cell, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, cell: impl Into<Cell>) {
        self.cells.insert(name.into(), cell.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    /// Text value of a field; `None` when absent or blank.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.cells.get(name).and_then(Cell::to_text)
    }

    /// Numeric value of a field; `None` when absent or non-numeric.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.cells.get(name).and_then(Cell::as_number)
    }

    /// Timestamp value of a field; `None` when absent or unparseable.
    #[must_use]
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.cells.get(name).and_then(Cell::as_timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<N: Into<String>, C: Into<Cell>> FromIterator<(N, C)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (N, C)>>(iter: T) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(name, cell)| (name.into(), cell.into()))
                .collect(),
        }
    }
}

/// An ordered sequence of rows from one export.
///
/// Row order is meaningful: duplicate-key resolution keeps the first
/// occurrence, and pipeline output preserves pilot-table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTable {
    rows: Vec<RawRow>,
}

impl RawTable {
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    #[must_use]
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: RawRow) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawRow> {
        self.rows.iter()
    }
}

impl IntoIterator for RawTable {
    type Item = RawRow;
    type IntoIter = std::vec::IntoIter<RawRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RawTable {
    type Item = &'a RawRow;
    type IntoIter = std::slice::Iter<'a, RawRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<RawRow> for RawTable {
    fn from_iter<T: IntoIterator<Item = RawRow>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// SourceRole
// ---------------------------------------------------------------------------

/// Which of the two exports a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    /// Operational export: timestamps, status, priority, dimensions.
    Pilot,
    /// Timing export: recorded first-response observations, explicit budgets.
    Sla,
}

impl SourceRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pilot => "pilot",
            Self::Sla => "sla",
        }
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
