//! One-pass aggregation of ticket records into a report payload.
//!
//! # Overview
//!
//! [`Summary::from_records`] walks the record set once and produces the
//! numbers a dashboard renders: SLA compliance percentages, lead-time and
//! aging averages, health counts, and the grouped breakdowns (status
//! category, priority, violation timeline, per-project and per-unit
//! averages).
//!
//! Percentages are computed over decided records only. A ticket whose
//! compliance is `Pending` or `NotApplicable` never moves a percentage in
//! either direction; when nothing is decided the percentage is `None`
//! rather than a misleading zero.

use std::collections::BTreeMap;

use serde::Serialize;
use suture_core::{Compliance, StatusCategory, TicketRecord, Verdict};
use tracing::debug;

/// SLA compliance percentages, `None` when no record is decided.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlaKpis {
    pub resolution_met_pct: Option<f64>,
    pub resolution_violated_pct: Option<f64>,
    pub first_response_met_pct: Option<f64>,
    pub first_response_violated_pct: Option<f64>,
}

/// Duration averages and health counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeKpis {
    /// Mean hours from creation to resolution, over closed tickets.
    pub avg_lead_time_hours: Option<f64>,
    /// Mean hours since creation, over open tickets.
    pub avg_aging_hours: Option<f64>,
    /// Open tickets whose aging has crossed the risk fraction.
    pub open_at_risk: usize,
    /// Tickets parked in an awaiting-validation status.
    pub awaiting_validation: usize,
}

/// Report payload for one record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub sla: SlaKpis,
    pub time: TimeKpis,
    pub by_status_category: BTreeMap<String, usize>,
    /// Counts keyed by the source's own priority labels; records without a
    /// priority are left out.
    pub by_priority: BTreeMap<String, usize>,
    /// Resolution violations per month label, the dashboard timeline.
    pub violations_by_month: BTreeMap<String, usize>,
    pub avg_lead_time_by_project: BTreeMap<String, f64>,
    pub avg_aging_by_business_unit: BTreeMap<String, f64>,
}

impl Summary {
    /// Aggregate `records` in one pass.
    ///
    /// Accepts any borrowing iteration, so both a full record slice and the
    /// subset returned by [`crate::filter::RecordFilter::apply`] work.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TicketRecord>,
    {
        let mut total = 0;
        let mut open = 0;
        let mut closed = 0;

        let mut resolution = ComplianceTally::default();
        let mut first_response = ComplianceTally::default();
        let mut lead_time = Mean::default();
        let mut aging = Mean::default();
        let mut open_at_risk = 0;
        let mut awaiting_validation = 0;

        let mut by_status_category = BTreeMap::new();
        let mut by_priority = BTreeMap::new();
        let mut violations_by_month = BTreeMap::new();
        let mut lead_time_by_project: BTreeMap<String, Mean> = BTreeMap::new();
        let mut aging_by_business_unit: BTreeMap<String, Mean> = BTreeMap::new();

        for record in records {
            total += 1;
            if record.is_open {
                open += 1;
            } else {
                closed += 1;
            }

            resolution.push(record.resolution_compliance);
            first_response.push(record.first_response_compliance);

            if let Some(hours) = record.lead_time_hours {
                lead_time.push(hours);
                if let Some(project) = &record.project {
                    lead_time_by_project
                        .entry(project.clone())
                        .or_default()
                        .push(hours);
                }
            }
            if let Some(hours) = record.aging_hours {
                aging.push(hours);
                if let Some(unit) = &record.business_unit {
                    aging_by_business_unit
                        .entry(unit.clone())
                        .or_default()
                        .push(hours);
                }
            }

            if record.risk == Verdict::Yes {
                open_at_risk += 1;
            }
            if record.status_category == StatusCategory::AwaitingValidation {
                awaiting_validation += 1;
            }

            bump(&mut by_status_category, record.status_category.to_string());
            if let Some(priority) = &record.priority {
                bump(&mut by_priority, priority.clone());
            }
            if record.sla_violated == Verdict::Yes {
                if let Some(month) = &record.period_month {
                    bump(&mut violations_by_month, month.clone());
                }
            }
        }

        debug!(total, open, closed, "summary aggregated");

        Self {
            total,
            open,
            closed,
            sla: SlaKpis {
                resolution_met_pct: resolution.met_pct(),
                resolution_violated_pct: resolution.violated_pct(),
                first_response_met_pct: first_response.met_pct(),
                first_response_violated_pct: first_response.violated_pct(),
            },
            time: TimeKpis {
                avg_lead_time_hours: lead_time.finish(),
                avg_aging_hours: aging.finish(),
                open_at_risk,
                awaiting_validation,
            },
            by_status_category,
            by_priority,
            violations_by_month,
            avg_lead_time_by_project: finish_means(lead_time_by_project),
            avg_aging_by_business_unit: finish_means(aging_by_business_unit),
        }
    }
}

fn bump(map: &mut BTreeMap<String, usize>, key: String) {
    *map.entry(key).or_insert(0) += 1;
}

fn finish_means(means: BTreeMap<String, Mean>) -> BTreeMap<String, f64> {
    means
        .into_iter()
        .filter_map(|(key, mean)| mean.finish().map(|avg| (key, avg)))
        .collect()
}

/// Yes/No counter over decided compliance values.
#[derive(Debug, Default)]
struct ComplianceTally {
    yes: usize,
    no: usize,
}

impl ComplianceTally {
    fn push(&mut self, compliance: Compliance) {
        match compliance {
            Compliance::Yes => self.yes += 1,
            Compliance::No => self.no += 1,
            Compliance::Pending | Compliance::NotApplicable => {}
        }
    }

    fn met_pct(&self) -> Option<f64> {
        percent(self.yes, self.yes + self.no)
    }

    fn violated_pct(&self) -> Option<f64> {
        percent(self.no, self.yes + self.no)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Streaming arithmetic mean.
#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
