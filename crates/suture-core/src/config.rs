//! Pipeline configuration.
//!
//! Status vocabulary, SLA budgets, the risk threshold, and the join policy are
//! deployment choices, never inferred from data. Shipped defaults cover the
//! common tracker vocabulary so an empty config file is a working config.

use crate::normalize::fold_key;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Time budgets for one priority level, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaBudget {
    /// Hours allowed from creation to resolution.
    pub resolution_hours: f64,
    /// Hours allowed until first response. When absent, half the resolution
    /// budget applies.
    #[serde(default)]
    pub first_response_hours: Option<f64>,
}

impl SlaBudget {
    #[must_use]
    pub const fn new(resolution_hours: f64) -> Self {
        Self {
            resolution_hours,
            first_response_hours: None,
        }
    }

    #[must_use]
    pub const fn with_first_response(mut self, hours: f64) -> Self {
        self.first_response_hours = Some(hours);
        self
    }
}

/// How the two exports are combined into one record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Keep only tickets present in both exports.
    #[default]
    Inner,
    /// Keep every pilot ticket; missing SLA fields stay absent.
    LeftPilot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Statuses that mean a ticket's lifecycle is over.
    #[serde(default = "default_closed_statuses")]
    pub closed_statuses: Vec<String>,
    /// Statuses that mean work is done but sign-off is pending.
    #[serde(default = "default_awaiting_statuses")]
    pub awaiting_statuses: Vec<String>,
    /// Budgets keyed by priority label.
    #[serde(default = "default_sla_hours_by_priority")]
    pub sla_hours_by_priority: BTreeMap<String, SlaBudget>,
    /// Fraction of the resolution budget an open ticket may consume before it
    /// counts as at risk.
    #[serde(default = "default_risk_threshold_fraction")]
    pub risk_threshold_fraction: f64,
    #[serde(default)]
    pub join_policy: JoinPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            closed_statuses: default_closed_statuses(),
            awaiting_statuses: default_awaiting_statuses(),
            sla_hours_by_priority: default_sla_hours_by_priority(),
            risk_threshold_fraction: default_risk_threshold_fraction(),
            join_policy: JoinPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// True when `status` names a closed lifecycle state. Matching folds case,
    /// accents, and separators the same way header matching does.
    #[must_use]
    pub fn is_closed_status(&self, status: &str) -> bool {
        let folded = fold_key(status);
        self.closed_statuses.iter().any(|s| fold_key(s) == folded)
    }

    /// True when `status` names an awaiting-validation state.
    #[must_use]
    pub fn is_awaiting_status(&self, status: &str) -> bool {
        let folded = fold_key(status);
        self.awaiting_statuses.iter().any(|s| fold_key(s) == folded)
    }

    /// Budget entry for a priority label, matched leniently.
    #[must_use]
    pub fn budget_for(&self, priority: &str) -> Option<SlaBudget> {
        let folded = fold_key(priority);
        self.sla_hours_by_priority
            .iter()
            .find(|(label, _)| fold_key(label) == folded)
            .map(|(_, budget)| *budget)
    }
}

/// Load configuration from a TOML file. An absent file yields the defaults;
/// an unreadable or malformed file is an error.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<PipelineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn default_closed_statuses() -> Vec<String> {
    ["Closed", "Resolved", "Done", "Cancelled"]
        .map(String::from)
        .to_vec()
}

fn default_awaiting_statuses() -> Vec<String> {
    ["Awaiting Validation", "Awaiting Approval", "Pending"]
        .map(String::from)
        .to_vec()
}

fn default_sla_hours_by_priority() -> BTreeMap<String, SlaBudget> {
    BTreeMap::from([
        (
            "Highest".to_string(),
            SlaBudget::new(4.0).with_first_response(1.0),
        ),
        (
            "High".to_string(),
            SlaBudget::new(8.0).with_first_response(2.0),
        ),
        (
            "Medium".to_string(),
            SlaBudget::new(24.0).with_first_response(8.0),
        ),
        ("Low".to_string(), SlaBudget::new(48.0)),
        (
            "Lowest".to_string(),
            SlaBudget::new(72.0).with_first_response(24.0),
        ),
    ])
}

const fn default_risk_threshold_fraction() -> f64 {
    0.8
}
