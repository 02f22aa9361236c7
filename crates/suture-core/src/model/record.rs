use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Whether an SLA budget was met for one ticket.
///
/// `Pending` means the observation is not in yet (ticket still open, or the
/// source never recorded a first response). `NotApplicable` means no budget
/// exists for the ticket's priority, so the question cannot be asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    Yes,
    No,
    Pending,
    NotApplicable,
}

impl Compliance {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Pending => "pending",
            Self::NotApplicable => "not_applicable",
        }
    }

    /// True when the observation is in and the budget comparison happened.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        matches!(self, Self::Yes | Self::No)
    }
}

/// Three-valued flag for violation and risk classifications.
///
/// Unlike [`Compliance`] there is no `Pending`: a flag either holds, does not
/// hold, or cannot be evaluated at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Yes,
    No,
    NotApplicable,
}

impl Verdict {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::NotApplicable => "not_applicable",
        }
    }
}

/// Coarse grouping of free-text ticket statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Closed,
    AwaitingValidation,
    InProgress,
}

impl StatusCategory {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::AwaitingValidation => "awaiting_validation",
            Self::InProgress => "in_progress",
        }
    }
}

/// One reconciled ticket with every derived SLA and health field populated.
///
/// Produced fresh on every pipeline run; the struct itself enforces nothing.
/// The invariants (unique keys, aging/lead-time exclusivity, non-negative
/// durations) are established by the pipeline that builds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketRecord {
    /// Join identifier shared by both exports. Never empty in pipeline output.
    pub key: String,
    /// Source priority label, kept as free text (the budget map is keyed by
    /// the source's own vocabulary).
    pub priority: Option<String>,
    /// Raw status text from the pilot export.
    pub status: String,
    /// Project dimension, passed through for grouping.
    pub project: Option<String>,
    /// Business-unit dimension, passed through for grouping.
    pub business_unit: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Recorded (or derived) first-response duration in hours. An observation,
    /// not a computed duration: negative source values survive into this field
    /// and are classified as violations instead of being clamped.
    pub first_response_hours: Option<f64>,
    pub sla_resolution_hours: Option<f64>,
    pub sla_first_response_hours: Option<f64>,
    /// `resolved_at - created_at` in hours, clamped to zero when the source
    /// timestamps run backwards.
    pub resolution_hours_calculated: Option<f64>,
    pub resolution_compliance: Compliance,
    pub first_response_compliance: Compliance,
    pub sla_violated: Verdict,
    pub is_open: bool,
    /// Hours since creation; populated only while the ticket is open.
    pub aging_hours: Option<f64>,
    /// Hours from creation to resolution; populated only once closed.
    pub lead_time_hours: Option<f64>,
    pub risk: Verdict,
    pub status_category: StatusCategory,
    pub period_year: Option<i32>,
    /// Sortable quarter label, e.g. `"2024-Q1"`.
    pub period_quarter: Option<String>,
    /// Sortable month label, e.g. `"2024-01"`.
    pub period_month: Option<String>,
}

impl Default for TicketRecord {
    fn default() -> Self {
        Self {
            key: String::new(),
            priority: None,
            status: String::new(),
            project: None,
            business_unit: None,
            created_at: None,
            resolved_at: None,
            first_response_hours: None,
            sla_resolution_hours: None,
            sla_first_response_hours: None,
            resolution_hours_calculated: None,
            resolution_compliance: Compliance::NotApplicable,
            first_response_compliance: Compliance::NotApplicable,
            sla_violated: Verdict::NotApplicable,
            is_open: true,
            aging_hours: None,
            lead_time_hours: None,
            risk: Verdict::NotApplicable,
            status_category: StatusCategory::InProgress,
            period_year: None,
            period_quarter: None,
            period_month: None,
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Compliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Compliance {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "pending" => Ok(Self::Pending),
            // "n/a" kept for exports written by earlier versions
            "not_applicable" | "n/a" => Ok(Self::NotApplicable),
            _ => Err(ParseEnumError {
                expected: "compliance",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Verdict {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "not_applicable" | "n/a" => Ok(Self::NotApplicable),
            _ => Err(ParseEnumError {
                expected: "verdict",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for StatusCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "closed" => Ok(Self::Closed),
            "awaiting_validation" => Ok(Self::AwaitingValidation),
            "in_progress" => Ok(Self::InProgress),
            _ => Err(ParseEnumError {
                expected: "status category",
                got: s.to_string(),
            }),
        }
    }
}
