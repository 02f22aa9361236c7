//! Data model for the reconciliation pipeline.
//!
//! # Module layout
//!
//! - [`table`]: the loose input side ([`Cell`], [`RawRow`], [`RawTable`],
//!   [`SourceRole`]).
//! - [`record`]: the canonical output side ([`TicketRecord`] and its
//!   classification enums).

pub mod record;
pub mod table;

pub use record::{Compliance, ParseEnumError, StatusCategory, TicketRecord, Verdict};
pub use table::{Cell, RawRow, RawTable, SourceRole, parse_timestamp};
