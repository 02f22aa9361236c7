//! Calendar bucketing of creation timestamps.
//!
//! Labels are plain strings shaped to sort chronologically as text
//! (`"2024-Q3"`, `"2024-07"`), so downstream grouping needs no date parsing.

use chrono::{DateTime, Datelike, Utc};

/// The period labels derived from one creation timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodLabels {
    pub year: Option<i32>,
    pub quarter: Option<String>,
    pub month: Option<String>,
}

/// Bucket a creation timestamp into calendar labels. Absent input yields
/// all-absent labels; the record still flows through.
#[must_use]
pub fn bucket(created_at: Option<DateTime<Utc>>) -> PeriodLabels {
    let Some(created) = created_at else {
        return PeriodLabels::default();
    };

    let year = created.year();
    let month = created.month();
    let quarter = (month - 1) / 3 + 1;

    PeriodLabels {
        year: Some(year),
        quarter: Some(format!("{year}-Q{quarter}")),
        month: Some(format!("{year}-{month:02}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{PeriodLabels, bucket};
    use chrono::{TimeZone, Utc};

    #[test]
    fn quarters_split_on_calendar_boundaries() {
        let cases = [
            (1, "2024-Q1"),
            (3, "2024-Q1"),
            (4, "2024-Q2"),
            (6, "2024-Q2"),
            (7, "2024-Q3"),
            (9, "2024-Q3"),
            (10, "2024-Q4"),
            (12, "2024-Q4"),
        ];

        for (month, expected) in cases {
            let ts = Utc.with_ymd_and_hms(2024, month, 15, 12, 0, 0).unwrap();
            let labels = bucket(Some(ts));
            assert_eq!(labels.quarter.as_deref(), Some(expected), "month {month}");
        }
    }

    #[test]
    fn month_labels_are_zero_padded_and_sortable() {
        let march = bucket(Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        let october = bucket(Some(Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap()));

        assert_eq!(march.month.as_deref(), Some("2024-03"));
        assert_eq!(october.month.as_deref(), Some("2024-10"));
        assert!(march.month < october.month, "text order is time order");
        assert_eq!(march.year, Some(2024));
    }

    #[test]
    fn absent_creation_yields_absent_labels() {
        assert_eq!(bucket(None), PeriodLabels::default());
    }
}
