//! Key-based reconciliation of the two normalized tables.
//!
//! # Overview
//!
//! Both exports describe the same tickets from different angles. This module
//! pairs them up by ticket key into one merged row per ticket. The pilot
//! export drives everything observable about the result: its row order is the
//! output order, and where both exports carry a field the pilot value stands.
//! SLA values only fill fields the pilot left blank.
//!
//! Rows that cannot participate (blank key) are dropped before joining, and
//! duplicate keys within one export collapse to the first occurrence. Both
//! choices are order-stable, so a run is deterministic for a given input.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::config::JoinPolicy;
use crate::error::PipelineError;
use crate::model::{Cell, RawRow, RawTable};
use crate::normalize::COL_KEY;

/// Join the normalized pilot and SLA tables into one merged table.
///
/// Under [`JoinPolicy::Inner`] only tickets present in both tables survive;
/// under [`JoinPolicy::LeftPilot`] every keyed pilot row survives and missing
/// SLA fields stay absent.
///
/// # Errors
///
/// Returns [`PipelineError::NoMatch`] when the merge produces zero rows.
#[instrument(skip(pilot, sla), fields(pilot_rows = pilot.len(), sla_rows = sla.len()))]
pub fn reconcile(
    pilot: &RawTable,
    sla: &RawTable,
    policy: JoinPolicy,
) -> Result<RawTable, PipelineError> {
    let sla_by_key = index_first_by_key(sla);

    let mut seen = HashSet::new();
    let mut merged = RawTable::new();

    for row in pilot {
        let Some(key) = row.text(COL_KEY) else {
            continue;
        };
        if !seen.insert(key.clone()) {
            continue;
        }

        match (sla_by_key.get(key.as_str()), policy) {
            (Some(sla_row), _) => merged.push(merge_rows(row, sla_row)),
            (None, JoinPolicy::LeftPilot) => merged.push(row.clone()),
            (None, JoinPolicy::Inner) => {}
        }
    }

    debug!(
        ?policy,
        merged_rows = merged.len(),
        pilot_keys = seen.len(),
        sla_keys = sla_by_key.len(),
        "reconciled source tables"
    );

    if merged.is_empty() {
        return Err(PipelineError::NoMatch);
    }
    Ok(merged)
}

/// First keyed occurrence per key; later duplicates are dropped.
fn index_first_by_key(table: &RawTable) -> HashMap<String, &RawRow> {
    let mut index = HashMap::new();
    for row in table {
        if let Some(key) = row.text(COL_KEY) {
            index.entry(key).or_insert(row);
        }
    }
    index
}

/// Pilot fields stand; SLA fields fill blanks and absences only.
fn merge_rows(pilot: &RawRow, sla: &RawRow) -> RawRow {
    let mut merged = pilot.clone();
    for (name, cell) in sla.iter() {
        if merged.get(name).is_none_or(Cell::is_blank) {
            merged.insert(name, cell.clone());
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{COL_PRIORITY, COL_SLA_RESOLUTION_HOURS, COL_STATUS};

    fn keyed_row(key: &str, extra: &[(&str, Cell)]) -> RawRow {
        let mut row = RawRow::new();
        row.insert(COL_KEY, key);
        for (name, cell) in extra {
            row.insert(*name, cell.clone());
        }
        row
    }

    fn table(rows: Vec<RawRow>) -> RawTable {
        RawTable::from_rows(rows)
    }

    #[test]
    fn inner_join_keeps_only_shared_keys() {
        let pilot = table(vec![keyed_row("T-1", &[]), keyed_row("T-2", &[])]);
        let sla = table(vec![keyed_row("T-2", &[]), keyed_row("T-3", &[])]);

        let merged = reconcile(&pilot, &sla, JoinPolicy::Inner).expect("join should succeed");
        let keys: Vec<_> = merged.iter().filter_map(|r| r.text(COL_KEY)).collect();
        assert_eq!(keys, vec!["T-2"]);
    }

    #[test]
    fn left_pilot_keeps_unmatched_pilot_rows() {
        let pilot = table(vec![keyed_row("T-1", &[]), keyed_row("T-2", &[])]);
        let sla = table(vec![keyed_row("T-2", &[(COL_SLA_RESOLUTION_HOURS, Cell::from(8.0))])]);

        let merged = reconcile(&pilot, &sla, JoinPolicy::LeftPilot).expect("join should succeed");
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.rows()[0].number(COL_SLA_RESOLUTION_HOURS), None);
        assert_eq!(merged.rows()[1].number(COL_SLA_RESOLUTION_HOURS), Some(8.0));
    }

    #[test]
    fn duplicate_keys_first_occurrence_wins_in_both_sources() {
        let pilot = table(vec![
            keyed_row("T-1", &[(COL_STATUS, Cell::from("Open"))]),
            keyed_row("T-1", &[(COL_STATUS, Cell::from("Closed"))]),
        ]);
        let sla = table(vec![
            keyed_row("T-1", &[(COL_SLA_RESOLUTION_HOURS, Cell::from(8.0))]),
            keyed_row("T-1", &[(COL_SLA_RESOLUTION_HOURS, Cell::from(99.0))]),
        ]);

        let merged = reconcile(&pilot, &sla, JoinPolicy::Inner).expect("join should succeed");
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.rows()[0].text(COL_STATUS), Some("Open".to_string()));
        assert_eq!(merged.rows()[0].number(COL_SLA_RESOLUTION_HOURS), Some(8.0));
    }

    #[test]
    fn blank_key_rows_are_dropped_before_joining() {
        let mut no_key = RawRow::new();
        no_key.insert(COL_STATUS, "Open");
        let mut blank_key = RawRow::new();
        blank_key.insert(COL_KEY, "   ");
        let mut null_key = RawRow::new();
        null_key.insert(COL_KEY, Cell::Null);

        let pilot = table(vec![no_key, blank_key, null_key, keyed_row("T-1", &[])]);
        let sla = table(vec![keyed_row("T-1", &[])]);

        let merged = reconcile(&pilot, &sla, JoinPolicy::Inner).expect("join should succeed");
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn output_preserves_pilot_order_regardless_of_sla_order() {
        let pilot = table(vec![
            keyed_row("T-3", &[]),
            keyed_row("T-1", &[]),
            keyed_row("T-2", &[]),
        ]);
        let sla = table(vec![
            keyed_row("T-1", &[]),
            keyed_row("T-2", &[]),
            keyed_row("T-3", &[]),
        ]);

        let merged = reconcile(&pilot, &sla, JoinPolicy::Inner).expect("join should succeed");
        let keys: Vec<_> = merged.iter().filter_map(|r| r.text(COL_KEY)).collect();
        assert_eq!(keys, vec!["T-3", "T-1", "T-2"]);
    }

    #[test]
    fn pilot_values_stand_and_sla_fills_blanks() {
        let pilot = table(vec![keyed_row(
            "T-1",
            &[
                (COL_PRIORITY, Cell::from("High")),
                (COL_STATUS, Cell::from("   ")),
            ],
        )]);
        let sla = table(vec![keyed_row(
            "T-1",
            &[
                (COL_PRIORITY, Cell::from("Low")),
                (COL_STATUS, Cell::from("Closed")),
            ],
        )]);

        let merged = reconcile(&pilot, &sla, JoinPolicy::Inner).expect("join should succeed");
        let row = &merged.rows()[0];
        assert_eq!(row.text(COL_PRIORITY), Some("High".to_string()));
        assert_eq!(row.text(COL_STATUS), Some("Closed".to_string()));
    }

    #[test]
    fn numeric_and_text_keys_join_on_rendered_form() {
        let pilot = table(vec![keyed_row("1234", &[])]);
        let mut numeric = RawRow::new();
        numeric.insert(COL_KEY, Cell::from(1234.0));
        let sla = table(vec![numeric]);

        let merged = reconcile(&pilot, &sla, JoinPolicy::Inner).expect("join should succeed");
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn disjoint_keys_are_a_no_match_error() {
        let pilot = table(vec![keyed_row("T-1", &[])]);
        let sla = table(vec![keyed_row("T-9", &[])]);

        let err = reconcile(&pilot, &sla, JoinPolicy::Inner).expect_err("nothing joins");
        assert_eq!(err, PipelineError::NoMatch);
    }

    #[test]
    fn keyless_pilot_under_left_policy_is_still_no_match() {
        let mut no_key = RawRow::new();
        no_key.insert(COL_STATUS, "Open");
        let pilot = table(vec![no_key]);
        let sla = table(vec![keyed_row("T-1", &[])]);

        let err = reconcile(&pilot, &sla, JoinPolicy::LeftPilot).expect_err("nothing joins");
        assert_eq!(err, PipelineError::NoMatch);
    }
}
