//! End-to-end pipeline over the two exports.
//!
//! # Overview
//!
//! One call takes the decoded pilot and SLA tables through recognition,
//! reconciliation, threshold resolution, metric derivation, and period
//! bucketing, and returns the canonical record set. The stages are the
//! modules of this crate; this module only sequences them and assembles the
//! output records.
//!
//! Hard failures ([`PipelineError::Schema`], [`PipelineError::NoMatch`])
//! surface unmodified and yield no partial results. Everything softer lands
//! in the records themselves as `Pending`/`NotApplicable` verdicts.
//!
//! [`run_at`] takes the evaluation instant as a parameter and is what tests
//! call; [`run`] is the wall-clock convenience wrapper.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::metrics::{self, MetricInputs};
use crate::model::{RawRow, RawTable, SourceRole, TicketRecord};
use crate::normalize::{
    COL_BUSINESS_UNIT, COL_CREATED_AT, COL_FIRST_RESPONSE_AT, COL_FIRST_RESPONSE_HOURS, COL_KEY,
    COL_PRIORITY, COL_PROJECT, COL_RESOLVED_AT, COL_SLA_FIRST_RESPONSE_HOURS,
    COL_SLA_RESOLUTION_HOURS, COL_STATUS, normalize_table,
};
use crate::period;
use crate::reconcile::reconcile;
use crate::sla::{self, RowThresholds};

/// Run the pipeline, evaluating open-ticket aging against `now`.
///
/// # Errors
///
/// Returns [`PipelineError::Schema`] when either table lacks a recognizable
/// identifier column, and [`PipelineError::NoMatch`] when reconciliation
/// matches nothing.
#[instrument(skip(pilot, sla, config), fields(pilot_rows = pilot.len(), sla_rows = sla.len()))]
pub fn run_at(
    pilot: &RawTable,
    sla: &RawTable,
    config: &PipelineConfig,
    now: DateTime<Utc>,
) -> Result<Vec<TicketRecord>, PipelineError> {
    let pilot = normalize_table(pilot, SourceRole::Pilot)?;
    let sla = normalize_table(sla, SourceRole::Sla)?;
    debug!(
        pilot_rows = pilot.len(),
        sla_rows = sla.len(),
        "source tables recognized"
    );

    let merged = reconcile(&pilot, &sla, config.join_policy)?;
    debug!(merged_rows = merged.len(), "tickets reconciled");

    let records: Vec<TicketRecord> = merged
        .iter()
        .map(|row| assemble(config, row, now))
        .collect();

    info!(records = records.len(), "pipeline run complete");
    Ok(records)
}

/// Run the pipeline against the current wall clock.
///
/// # Errors
///
/// Same failure modes as [`run_at`].
pub fn run(
    pilot: &RawTable,
    sla: &RawTable,
    config: &PipelineConfig,
) -> Result<Vec<TicketRecord>, PipelineError> {
    run_at(pilot, sla, config, Utc::now())
}

/// Build one canonical record from one merged row.
fn assemble(config: &PipelineConfig, row: &RawRow, now: DateTime<Utc>) -> TicketRecord {
    let status = row.text(COL_STATUS).unwrap_or_default();
    let priority = row.text(COL_PRIORITY);
    let created_at = row.timestamp(COL_CREATED_AT);
    let resolved_at = row.timestamp(COL_RESOLVED_AT);
    let first_response_hours = first_response_hours(row, created_at);

    let resolved_sla = sla::resolve(
        config,
        priority.as_deref(),
        RowThresholds {
            resolution_hours: row.number(COL_SLA_RESOLUTION_HOURS),
            first_response_hours: row.number(COL_SLA_FIRST_RESPONSE_HOURS),
        },
    );

    let classification = metrics::classify(
        config,
        &MetricInputs {
            status: &status,
            created_at,
            resolved_at,
            first_response_hours,
            sla: resolved_sla,
        },
        now,
    );

    let periods = period::bucket(created_at);

    TicketRecord {
        key: row.text(COL_KEY).unwrap_or_default(),
        priority,
        status,
        project: row.text(COL_PROJECT),
        business_unit: row.text(COL_BUSINESS_UNIT),
        created_at,
        resolved_at,
        first_response_hours,
        sla_resolution_hours: resolved_sla.resolution_hours,
        sla_first_response_hours: resolved_sla.first_response_hours,
        resolution_hours_calculated: classification.resolution_hours_calculated,
        resolution_compliance: classification.resolution_compliance,
        first_response_compliance: classification.first_response_compliance,
        sla_violated: classification.sla_violated,
        is_open: classification.is_open,
        aging_hours: classification.aging_hours,
        lead_time_hours: classification.lead_time_hours,
        risk: classification.risk,
        status_category: classification.status_category,
        period_year: periods.year,
        period_quarter: periods.quarter,
        period_month: periods.month,
    }
}

/// A recorded duration column wins; otherwise derive from the first-response
/// timestamp. The result stays signed (it is an observation).
fn first_response_hours(row: &RawRow, created_at: Option<DateTime<Utc>>) -> Option<f64> {
    row.number(COL_FIRST_RESPONSE_HOURS).or_else(|| {
        match (created_at, row.timestamp(COL_FIRST_RESPONSE_AT)) {
            (Some(created), Some(first_response)) => {
                Some(metrics::hours_between(created, first_response))
            }
            _ => None,
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Compliance, Verdict};
    use chrono::TimeZone;

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, h, 0, 0).unwrap()
    }

    fn pilot_row(key: &str, priority: &str, status: &str, created: u32) -> RawRow {
        let mut row = RawRow::new();
        row.insert("Chave", key);
        row.insert("Prioridade", priority);
        row.insert("Status", status);
        row.insert("Data_Cria", Cell::from(ts(created)));
        row
    }

    fn sla_row(key: &str) -> RawRow {
        let mut row = RawRow::new();
        row.insert("Chave", key);
        row
    }

    #[test]
    fn run_at_produces_one_record_per_reconciled_ticket() {
        let mut open = pilot_row("T-1", "High", "In Progress", 0);
        open.insert("Projeto", "Atlas");
        let mut closed = pilot_row("T-2", "High", "Closed", 0);
        closed.insert("Data_Fecha", Cell::from(ts(4)));

        let pilot = RawTable::from_rows(vec![open, closed]);
        let sla = RawTable::from_rows(vec![sla_row("T-1"), sla_row("T-2")]);
        let config = PipelineConfig::default();

        let records = run_at(&pilot, &sla, &config, ts(7)).expect("pipeline should run");
        assert_eq!(records.len(), 2);

        let open = &records[0];
        assert_eq!(open.key, "T-1");
        assert!(open.is_open);
        assert_eq!(open.project.as_deref(), Some("Atlas"));
        assert_eq!(open.aging_hours, Some(7.0));
        assert_eq!(open.lead_time_hours, None);
        assert_eq!(open.resolution_compliance, Compliance::Pending);
        assert_eq!(open.risk, Verdict::Yes, "7h of an 8h budget is past 80%");
        assert_eq!(open.period_quarter.as_deref(), Some("2024-Q2"));

        let closed = &records[1];
        assert!(!closed.is_open);
        assert_eq!(closed.lead_time_hours, Some(4.0));
        assert_eq!(closed.aging_hours, None);
        assert_eq!(closed.resolution_compliance, Compliance::Yes);
        assert_eq!(closed.sla_violated, Verdict::No);
    }

    #[test]
    fn first_response_derives_from_timestamps_when_no_duration_column() {
        let mut row = pilot_row("T-1", "High", "In Progress", 0);
        row.insert("Data_Primeira_Resp", Cell::from(ts(3)));

        let pilot = RawTable::from_rows(vec![row]);
        let sla = RawTable::from_rows(vec![sla_row("T-1")]);
        let config = PipelineConfig::default();

        let records = run_at(&pilot, &sla, &config, ts(7)).expect("pipeline should run");
        assert_eq!(records[0].first_response_hours, Some(3.0));
        // 3h recorded against High's 2h budget.
        assert_eq!(records[0].first_response_compliance, Compliance::No);
    }

    #[test]
    fn recorded_duration_column_outranks_the_timestamp_derivation() {
        let mut row = pilot_row("T-1", "High", "In Progress", 0);
        row.insert("Data_Primeira_Resp", Cell::from(ts(3)));
        row.insert("Tempo_Primeira_Resposta", Cell::from(1.0));

        let pilot = RawTable::from_rows(vec![row]);
        let sla = RawTable::from_rows(vec![sla_row("T-1")]);
        let config = PipelineConfig::default();

        let records = run_at(&pilot, &sla, &config, ts(7)).expect("pipeline should run");
        assert_eq!(records[0].first_response_hours, Some(1.0));
    }

    #[test]
    fn per_row_sla_columns_override_the_priority_map() {
        let pilot = RawTable::from_rows(vec![pilot_row("T-1", "High", "In Progress", 0)]);
        let mut timing = sla_row("T-1");
        timing.insert("SLA_Horas", Cell::from(100.0));
        let sla = RawTable::from_rows(vec![timing]);
        let config = PipelineConfig::default();

        let records = run_at(&pilot, &sla, &config, ts(7)).expect("pipeline should run");
        assert_eq!(records[0].sla_resolution_hours, Some(100.0));
        // High's configured 2h first-response budget still stands.
        assert_eq!(records[0].sla_first_response_hours, Some(2.0));
        assert_eq!(records[0].risk, Verdict::No, "7h of 100h is nowhere near risk");
    }

    #[test]
    fn schema_failures_surface_with_role_attribution() {
        let pilot = RawTable::from_rows(vec![pilot_row("T-1", "High", "Open", 0)]);
        let mut anonymous = RawRow::new();
        anonymous.insert("Horas", Cell::from(4.0));
        let sla = RawTable::from_rows(vec![anonymous]);

        let err = run_at(&pilot, &sla, &PipelineConfig::default(), ts(7))
            .expect_err("sla table has no key");
        assert!(matches!(
            err,
            PipelineError::Schema {
                role: SourceRole::Sla,
                ..
            }
        ));
    }

    #[test]
    fn disjoint_sources_surface_no_match() {
        let pilot = RawTable::from_rows(vec![pilot_row("T-1", "High", "Open", 0)]);
        let sla = RawTable::from_rows(vec![sla_row("T-99")]);

        let err = run_at(&pilot, &sla, &PipelineConfig::default(), ts(7))
            .expect_err("keys are disjoint");
        assert_eq!(err, PipelineError::NoMatch);
    }

    #[test]
    fn wall_clock_wrapper_runs() {
        let pilot = RawTable::from_rows(vec![pilot_row("T-1", "High", "In Progress", 0)]);
        let sla = RawTable::from_rows(vec![sla_row("T-1")]);

        let records = run(&pilot, &sla, &PipelineConfig::default()).expect("pipeline should run");
        assert_eq!(records.len(), 1);
        assert!(records[0].aging_hours.is_some_and(|h| h >= 0.0));
    }
}
