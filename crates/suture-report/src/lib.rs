#![forbid(unsafe_code)]
//! Reporting layer over reconciled ticket records.
//!
//! # Overview
//!
//! `suture-core` turns a pair of raw exports into [`TicketRecord`]s; this
//! crate turns those records into what a dashboard shows. [`RecordFilter`]
//! narrows the set by project, business unit, or calendar period, and
//! [`Summary`] aggregates whatever subset remains into KPI percentages,
//! duration averages, and grouped breakdowns.
//!
//! Both layers are pure over their input slice. Filtering borrows, summary
//! reads once, and nothing here touches the pipeline's configuration or
//! sources.
//!
//! # Conventions
//!
//! - **Errors**: Aggregation cannot fail; absent denominators surface as
//!   `None`, never as errors or zeros.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`,
//!   `debug!`, `trace!`).

pub mod filter;
pub mod summary;

pub use filter::{
    PeriodGranularity, PeriodSelector, RecordFilter, distinct_business_units, distinct_projects,
    period_options,
};
pub use summary::{SlaKpis, Summary, TimeKpis};

pub use suture_core::TicketRecord;
