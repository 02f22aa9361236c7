#![forbid(unsafe_code)]
//! suture-core library.
//!
//! Reconciles a pair of ticket-tracking exports (the operational "pilot"
//! table and the SLA timing table) into one canonical, SLA-annotated record
//! set. The pipeline recognizes whatever column spellings the exports use,
//! joins the two tables on ticket key, resolves per-priority time budgets,
//! derives compliance/risk/aging/lead-time verdicts at an explicit evaluation
//! instant, and buckets records into calendar periods.
//!
//! Entry points are [`pipeline::run_at`] and [`pipeline::run`]; everything
//! else is the stages they sequence.
//!
//! # Conventions
//!
//! - **Errors**: typed [`PipelineError`] at the pipeline boundary;
//!   `anyhow::Result` for filesystem concerns (config loading).
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`,
//!   `trace!`).

pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod period;
pub mod pipeline;
pub mod reconcile;
pub mod sla;

pub use config::{JoinPolicy, PipelineConfig, SlaBudget, load_config};
pub use error::PipelineError;
pub use model::{
    Cell, Compliance, RawRow, RawTable, SourceRole, StatusCategory, TicketRecord, Verdict,
};
pub use pipeline::{run, run_at};
