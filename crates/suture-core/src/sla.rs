//! SLA budget resolution.
//!
//! Turns a ticket's priority label into the pair of time budgets the metric
//! pass measures against. The chain, most specific first:
//!
//! 1. explicit per-row threshold columns from a source table,
//! 2. the configured budget entry for the priority,
//! 3. for first response only, half the effective resolution budget.
//!
//! A ticket whose priority is absent or unmapped resolves to no budgets at
//! all; downstream that reads as `NotApplicable`, never as an error.

use crate::config::PipelineConfig;

/// First-response budget as a fraction of the resolution budget, used when no
/// explicit first-response budget exists anywhere.
const FIRST_RESPONSE_FRACTION: f64 = 0.5;

/// Threshold columns a source row may carry. Row values outrank configured
/// budgets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowThresholds {
    pub resolution_hours: Option<f64>,
    pub first_response_hours: Option<f64>,
}

/// The budgets one ticket is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedSla {
    pub resolution_hours: Option<f64>,
    pub first_response_hours: Option<f64>,
}

/// Resolve the budgets for one ticket.
///
/// Negative row thresholds are ignored; a budget below zero means the column
/// was misread, not that the ticket was due before it existed.
#[must_use]
pub fn resolve(
    config: &PipelineConfig,
    priority: Option<&str>,
    row: RowThresholds,
) -> ResolvedSla {
    let budget = priority.and_then(|p| config.budget_for(p));

    let resolution_hours = sane(row.resolution_hours)
        .or_else(|| budget.map(|b| b.resolution_hours));

    let first_response_hours = sane(row.first_response_hours)
        .or_else(|| budget.and_then(|b| b.first_response_hours))
        .or_else(|| resolution_hours.map(|h| h * FIRST_RESPONSE_FRACTION));

    ResolvedSla {
        resolution_hours,
        first_response_hours,
    }
}

fn sane(hours: Option<f64>) -> Option<f64> {
    hours.filter(|h| h.is_finite() && *h >= 0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
