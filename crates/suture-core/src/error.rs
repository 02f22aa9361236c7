//! Pipeline error type.
//!
//! Only two conditions abort a run: a source table whose schema cannot be
//! recognized, and a reconciliation that matches nothing. Everything else the
//! exports get wrong (missing priorities, absent timestamps, negative raw
//! durations) degrades per-record instead of failing the run.

use crate::model::SourceRole;

/// Errors returned by the reconciliation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// A required column could not be located in a source table after all
    /// header-offset attempts.
    #[error("{role} table schema error: {reason}")]
    Schema { role: SourceRole, reason: String },

    /// Reconciliation produced zero rows. The exports are individually
    /// readable but share no ticket keys.
    #[error("no reconciled rows: the two exports share no ticket keys")]
    NoMatch,
}

impl PipelineError {
    /// Stable code identifier for machine parsing.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "E1101",
            Self::NoMatch => "E1102",
        }
    }

    /// Remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(&self) -> &'static str {
        match self {
            Self::Schema { .. } => {
                "Check that the export has its header row in the first two rows \
                 and carries a ticket-key column."
            }
            Self::NoMatch => {
                "Check that both exports cover the same tracker project and \
                 date range."
            }
        }
    }

    /// Convenience constructor for schema failures.
    #[must_use]
    pub fn schema(role: SourceRole, reason: impl Into<String>) -> Self {
        Self::Schema {
            role,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineError;
    use crate::model::SourceRole;

    #[test]
    fn schema_error_names_the_offending_source() {
        let err = PipelineError::schema(SourceRole::Sla, "no recognizable ticket-key column");
        assert_eq!(
            err.to_string(),
            "sla table schema error: no recognizable ticket-key column"
        );
        assert_eq!(err.code(), "E1101");
    }

    #[test]
    fn no_match_reads_as_data_quality_failure() {
        let err = PipelineError::NoMatch;
        assert!(err.to_string().contains("share no ticket keys"));
        assert!(err.hint().contains("same tracker project"));
    }

    #[test]
    fn codes_are_unique() {
        assert_ne!(
            PipelineError::schema(SourceRole::Pilot, "x").code(),
            PipelineError::NoMatch.code()
        );
    }
}
