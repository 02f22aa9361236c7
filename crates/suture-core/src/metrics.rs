//! Per-ticket metric derivation.
//!
//! # Overview
//!
//! Every function here is pure and total: `now` arrives as a parameter, no
//! clock is sampled, and every combination of absent or malformed inputs
//! degrades to `Pending`/`NotApplicable`/clamped-zero instead of failing. The
//! exports get real-world dirty, so the dirty cases are first-class branches,
//! not error paths.
//!
//! [`classify`] assembles the individual rules into one verdict set for a
//! ticket; the rules stay public so each branch is testable on its own.
//!
//! Two invariants hold by construction:
//!
//! - `aging_hours` and `lead_time_hours` are never both populated (split on
//!   `is_open`).
//! - a ticket is never simultaneously at risk and in violation (`risk` defers
//!   to a `No` resolution compliance).

use chrono::{DateTime, Utc};

use crate::config::PipelineConfig;
use crate::model::{Compliance, StatusCategory, Verdict};
use crate::sla::ResolvedSla;

// ---------------------------------------------------------------------------
// Inputs and output
// ---------------------------------------------------------------------------

/// One merged ticket's fields, thresholds already resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricInputs<'a> {
    pub status: &'a str,
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Recorded or derived first-response duration. An observation, kept
    /// signed; never clamped.
    pub first_response_hours: Option<f64>,
    pub sla: ResolvedSla,
}

/// The derived verdicts and durations for one ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Resolution duration as emitted, clamped to ≥ 0. Compliance is judged
    /// on the signed value before clamping.
    pub resolution_hours_calculated: Option<f64>,
    pub resolution_compliance: Compliance,
    pub first_response_compliance: Compliance,
    pub sla_violated: Verdict,
    pub is_open: bool,
    pub aging_hours: Option<f64>,
    pub lead_time_hours: Option<f64>,
    pub risk: Verdict,
    pub status_category: StatusCategory,
}

/// Derive the full verdict set for one ticket at the given instant.
#[must_use]
pub fn classify(
    config: &PipelineConfig,
    inputs: &MetricInputs<'_>,
    now: DateTime<Utc>,
) -> Classification {
    let signed_resolution = match (inputs.created_at, inputs.resolved_at) {
        (Some(created), Some(resolved)) => Some(hours_between(created, resolved)),
        _ => None,
    };

    let open = is_open(config, inputs.status);
    let resolution_compliance = resolution_compliance(
        inputs.sla.resolution_hours,
        signed_resolution,
        inputs.created_at,
        now,
    );
    let aging = aging_hours(open, inputs.created_at, now);

    Classification {
        resolution_hours_calculated: signed_resolution.map(|h| h.max(0.0)),
        resolution_compliance,
        first_response_compliance: first_response_compliance(
            inputs.sla.first_response_hours,
            inputs.first_response_hours,
        ),
        sla_violated: violation_flag(resolution_compliance),
        is_open: open,
        aging_hours: aging,
        lead_time_hours: lead_time_hours(open, signed_resolution),
        risk: risk_flag(
            config,
            open,
            aging,
            inputs.sla.resolution_hours,
            resolution_compliance,
        ),
        status_category: status_category(config, inputs.status),
    }
}

// ---------------------------------------------------------------------------
// Individual rules
// ---------------------------------------------------------------------------

/// Signed duration between two instants, in hours.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 3_600_000.0
}

/// Judge resolution compliance on the signed duration.
///
/// An unresolved ticket is `Pending` until its provisional aging already
/// exceeds the threshold, at which point the outcome is settled (`No`) even
/// though the ticket is still open. A negative duration (resolved before
/// created) is an integrity violation and never passes.
#[must_use]
pub fn resolution_compliance(
    threshold_hours: Option<f64>,
    signed_duration_hours: Option<f64>,
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Compliance {
    let Some(threshold) = threshold_hours else {
        return Compliance::NotApplicable;
    };

    match signed_duration_hours {
        Some(duration) if duration < 0.0 => Compliance::No,
        Some(duration) => {
            if duration <= threshold {
                Compliance::Yes
            } else {
                Compliance::No
            }
        }
        None => {
            let provisional = created_at.map(|created| hours_between(created, now).max(0.0));
            match provisional {
                Some(aging) if aging > threshold => Compliance::No,
                _ => Compliance::Pending,
            }
        }
    }
}

/// Judge first-response compliance on the recorded duration alone. There is
/// no fallback to current time; an unanswered ticket stays `Pending`.
#[must_use]
pub fn first_response_compliance(
    threshold_hours: Option<f64>,
    recorded_hours: Option<f64>,
) -> Compliance {
    let Some(threshold) = threshold_hours else {
        return Compliance::NotApplicable;
    };
    let Some(recorded) = recorded_hours else {
        return Compliance::Pending;
    };

    if recorded < 0.0 {
        return Compliance::No;
    }
    if recorded <= threshold {
        Compliance::Yes
    } else {
        Compliance::No
    }
}

/// The violation flag restates resolution compliance; it never has an
/// opinion of its own.
#[must_use]
pub const fn violation_flag(resolution: Compliance) -> Verdict {
    match resolution {
        Compliance::No => Verdict::Yes,
        Compliance::Yes => Verdict::No,
        Compliance::Pending | Compliance::NotApplicable => Verdict::NotApplicable,
    }
}

/// A ticket is open until its status lands in the configured closed set.
#[must_use]
pub fn is_open(config: &PipelineConfig, status: &str) -> bool {
    !config.is_closed_status(status)
}

/// Hours an open ticket has existed, clamped to ≥ 0.
#[must_use]
pub fn aging_hours(
    is_open: bool,
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<f64> {
    if !is_open {
        return None;
    }
    created_at.map(|created| hours_between(created, now).max(0.0))
}

/// Hours from creation to resolution for a closed ticket, clamped to ≥ 0.
#[must_use]
pub fn lead_time_hours(is_open: bool, signed_resolution_hours: Option<f64>) -> Option<f64> {
    if is_open {
        return None;
    }
    signed_resolution_hours.map(|h| h.max(0.0))
}

/// An open ticket is at risk once its aging burns through the configured
/// fraction of its resolution budget, unless compliance already says `No`
/// (then it is violated, not at risk).
#[must_use]
pub fn risk_flag(
    config: &PipelineConfig,
    is_open: bool,
    aging_hours: Option<f64>,
    threshold_hours: Option<f64>,
    resolution_compliance: Compliance,
) -> Verdict {
    let (Some(aging), Some(threshold)) = (aging_hours, threshold_hours) else {
        return Verdict::NotApplicable;
    };
    if !is_open {
        return Verdict::NotApplicable;
    }

    if aging > config.risk_threshold_fraction * threshold
        && resolution_compliance != Compliance::No
    {
        Verdict::Yes
    } else {
        Verdict::No
    }
}

/// Bucket a status into its lifecycle category. Closed wins over awaiting
/// when a vocabulary lists a status in both sets.
#[must_use]
pub fn status_category(config: &PipelineConfig, status: &str) -> StatusCategory {
    if config.is_closed_status(status) {
        StatusCategory::Closed
    } else if config.is_awaiting_status(status) {
        StatusCategory::AwaitingValidation
    } else {
        StatusCategory::InProgress
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
