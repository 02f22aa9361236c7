//! Record filtering for presentation collaborators.
//!
//! A dashboard narrows the record set by project, business unit, and one
//! calendar period before aggregating. The filter here is that narrowing,
//! plus the distinct-value helpers a collaborator needs to populate its
//! option lists.

use serde::{Deserialize, Serialize};
use suture_core::TicketRecord;

/// One calendar period, matched against a record's period labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodSelector {
    Year(i32),
    /// Quarter label, e.g. `"2024-Q3"`.
    Quarter(String),
    /// Month label, e.g. `"2024-07"`.
    Month(String),
}

impl PeriodSelector {
    #[must_use]
    pub fn matches(&self, record: &TicketRecord) -> bool {
        match self {
            Self::Year(year) => record.period_year == Some(*year),
            Self::Quarter(label) => record.period_quarter.as_deref() == Some(label.as_str()),
            Self::Month(label) => record.period_month.as_deref() == Some(label.as_str()),
        }
    }
}

/// Granularity of the period option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGranularity {
    Year,
    Quarter,
    Month,
}

/// Conjunctive record filter; `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub project: Option<String>,
    pub business_unit: Option<String>,
    pub period: Option<PeriodSelector>,
}

impl RecordFilter {
    #[must_use]
    pub fn matches(&self, record: &TicketRecord) -> bool {
        if let Some(project) = &self.project {
            if record.project.as_deref() != Some(project.as_str()) {
                return false;
            }
        }
        if let Some(unit) = &self.business_unit {
            if record.business_unit.as_deref() != Some(unit.as_str()) {
                return false;
            }
        }
        self.period
            .as_ref()
            .is_none_or(|period| period.matches(record))
    }

    /// Borrowing subset of `records` that passes the filter, in input order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [TicketRecord]) -> Vec<&'a TicketRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Distinct project names, sorted.
#[must_use]
pub fn distinct_projects(records: &[TicketRecord]) -> Vec<String> {
    distinct(records.iter().filter_map(|r| r.project.clone()))
}

/// Distinct business units, sorted.
#[must_use]
pub fn distinct_business_units(records: &[TicketRecord]) -> Vec<String> {
    distinct(records.iter().filter_map(|r| r.business_unit.clone()))
}

/// Distinct period values at one granularity. Years ascend; quarter and
/// month labels list newest first, so the freshest period is the default
/// pick in an option list.
#[must_use]
pub fn period_options(records: &[TicketRecord], granularity: PeriodGranularity) -> Vec<String> {
    match granularity {
        PeriodGranularity::Year => {
            distinct(records.iter().filter_map(|r| r.period_year.map(|y| y.to_string())))
        }
        PeriodGranularity::Quarter => {
            let mut labels = distinct(records.iter().filter_map(|r| r.period_quarter.clone()));
            labels.reverse();
            labels
        }
        PeriodGranularity::Month => {
            let mut labels = distinct(records.iter().filter_map(|r| r.period_month.clone()));
            labels.reverse();
            labels
        }
    }
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = values.collect();
    out.sort_unstable();
    out.dedup();
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
