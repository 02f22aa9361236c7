//! Header recognition for source tables.
//!
//! # Overview
//!
//! The two exports never agree on column names: the same field arrives as
//! `Key` or `Chave`, `Created` or `Data_Cria`, `Business Unit` or
//! `Unidade de Negócio`, varying by tracker locale and export version. This
//! module renames whatever arrives to one canonical vocabulary so the rest of
//! the pipeline never branches on spelling. Value typing is not handled here;
//! [`Cell`](crate::model::Cell) coercions type fields lazily at read time.
//!
//! Recognition is a pure transform in two steps:
//!
//! 1. **Folding**: [`fold_key`] collapses case, accents, and separators, so
//!    `Unidade de Negócio` and `unidade_de_negocio` are the same name.
//! 2. **Synonym lookup**: a declared table maps folded names to canonical
//!    ones. Unrecognized columns are dropped.
//!
//! Some exports bury the real header in the first data row (a title row above
//! it). When an attempt finds no identifier column, the next header offset is
//! tried: at offset *k* > 0, row *k*-1's cell values become the column names
//! and data starts at row *k*. Offsets are tried in declared order; first
//! success wins.

use tracing::{debug, instrument};

use crate::error::PipelineError;
use crate::model::{RawRow, RawTable, SourceRole};

/// Header offsets tried in order when recognizing a table.
pub const HEADER_OFFSETS: [usize; 2] = [0, 1];

// ---------------------------------------------------------------------------
// Canonical column names
// ---------------------------------------------------------------------------

pub const COL_KEY: &str = "key";
pub const COL_PRIORITY: &str = "priority";
pub const COL_STATUS: &str = "status";
pub const COL_CREATED_AT: &str = "created_at";
pub const COL_RESOLVED_AT: &str = "resolved_at";
pub const COL_FIRST_RESPONSE_AT: &str = "first_response_at";
pub const COL_FIRST_RESPONSE_HOURS: &str = "first_response_hours";
pub const COL_SLA_RESOLUTION_HOURS: &str = "sla_resolution_hours";
pub const COL_SLA_FIRST_RESPONSE_HOURS: &str = "sla_first_response_hours";
pub const COL_PROJECT: &str = "project";
pub const COL_BUSINESS_UNIT: &str = "business_unit";

/// Synonyms shared by both roles, in folded form.
const SHARED_SYNONYMS: &[(&str, &str)] = &[
    (COL_KEY, COL_KEY),
    ("chave", COL_KEY),
    ("issue_key", COL_KEY),
    ("ticket_key", COL_KEY),
    (COL_PRIORITY, COL_PRIORITY),
    ("prioridade", COL_PRIORITY),
    (COL_STATUS, COL_STATUS),
    ("situacao", COL_STATUS),
    ("state", COL_STATUS),
    (COL_CREATED_AT, COL_CREATED_AT),
    ("created", COL_CREATED_AT),
    ("creation_date", COL_CREATED_AT),
    ("criado", COL_CREATED_AT),
    ("criado_em", COL_CREATED_AT),
    ("data_cria", COL_CREATED_AT),
    ("data_criacao", COL_CREATED_AT),
    (COL_RESOLVED_AT, COL_RESOLVED_AT),
    ("resolved", COL_RESOLVED_AT),
    ("resolution_date", COL_RESOLVED_AT),
    ("resolvido", COL_RESOLVED_AT),
    ("resolvido_em", COL_RESOLVED_AT),
    ("data_fecha", COL_RESOLVED_AT),
    ("data_fechamento", COL_RESOLVED_AT),
    (COL_FIRST_RESPONSE_AT, COL_FIRST_RESPONSE_AT),
    ("first_response", COL_FIRST_RESPONSE_AT),
    ("data_primeira_resp", COL_FIRST_RESPONSE_AT),
    ("data_primeira_resposta", COL_FIRST_RESPONSE_AT),
    (COL_FIRST_RESPONSE_HOURS, COL_FIRST_RESPONSE_HOURS),
    ("horas_primeira_resposta", COL_FIRST_RESPONSE_HOURS),
    ("tempo_primeira_resposta", COL_FIRST_RESPONSE_HOURS),
    (COL_SLA_RESOLUTION_HOURS, COL_SLA_RESOLUTION_HOURS),
    ("sla_horas_resolucao", COL_SLA_RESOLUTION_HOURS),
    ("resolution_sla_hours", COL_SLA_RESOLUTION_HOURS),
    (COL_SLA_FIRST_RESPONSE_HOURS, COL_SLA_FIRST_RESPONSE_HOURS),
    ("sla_horas_primeira_resposta", COL_SLA_FIRST_RESPONSE_HOURS),
    ("first_response_sla_hours", COL_SLA_FIRST_RESPONSE_HOURS),
    (COL_PROJECT, COL_PROJECT),
    ("projeto", COL_PROJECT),
    (COL_BUSINESS_UNIT, COL_BUSINESS_UNIT),
    ("unidade_de_negocio", COL_BUSINESS_UNIT),
];

/// Synonyms only the SLA export gets. A bare `SLA`/`SLA_Horas` column in the
/// timing export is its resolution budget; in the pilot export the same name
/// is too ambiguous to claim.
const SLA_ONLY_SYNONYMS: &[(&str, &str)] = &[
    ("sla", COL_SLA_RESOLUTION_HOURS),
    ("sla_horas", COL_SLA_RESOLUTION_HOURS),
    ("sla_hours", COL_SLA_RESOLUTION_HOURS),
];

// ---------------------------------------------------------------------------
// Folding
// ---------------------------------------------------------------------------

/// Collapse a column name, status, or priority label to a comparable form:
/// lowercase, accents stripped, separator runs folded to one underscore.
#[must_use]
pub fn fold_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for ch in raw.trim().chars() {
        for lowered in ch.to_lowercase() {
            match fold_char(lowered) {
                Some(c) => {
                    if pending_sep && !out.is_empty() {
                        out.push('_');
                    }
                    pending_sep = false;
                    out.push(c);
                }
                None => pending_sep = true,
            }
        }
    }

    out
}

/// ASCII-alphanumerics pass through; Latin accents strip to their base
/// letter; everything else is a separator.
const fn fold_char(c: char) -> Option<char> {
    match c {
        'a'..='z' | '0'..='9' => Some(c),
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => Some('a'),
        'é' | 'è' | 'ê' | 'ë' => Some('e'),
        'í' | 'ì' | 'î' | 'ï' => Some('i'),
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => Some('o'),
        'ú' | 'ù' | 'û' | 'ü' => Some('u'),
        'ç' => Some('c'),
        'ñ' => Some('n'),
        _ => None,
    }
}

/// Canonical name for a folded column name, if recognized for the role.
fn canonical_for(folded: &str, role: SourceRole) -> Option<&'static str> {
    let shared = SHARED_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == folded)
        .map(|(_, canonical)| *canonical);
    if shared.is_some() {
        return shared;
    }

    match role {
        SourceRole::Sla => SLA_ONLY_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == folded)
            .map(|(_, canonical)| *canonical),
        SourceRole::Pilot => None,
    }
}

// ---------------------------------------------------------------------------
// Table normalization
// ---------------------------------------------------------------------------

/// Rename a source table's columns to the canonical vocabulary.
///
/// Tries each entry of [`HEADER_OFFSETS`] in order; an attempt succeeds when
/// it locates the identifier column. Unrecognized columns are dropped. When
/// two source columns fold to the same canonical name, the first (by source
/// column order) wins.
///
/// # Errors
///
/// Returns [`PipelineError::Schema`] ("missing identifier column") when no
/// offset attempt can locate the identifier column. An empty table fails the
/// same way since it cannot reveal its header at all.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn normalize_table(table: &RawTable, role: SourceRole) -> Result<RawTable, PipelineError> {
    for offset in HEADER_OFFSETS {
        if let Some(normalized) = try_offset(table, role, offset) {
            debug!(%role, offset, rows = normalized.len(), "recognized source table");
            return Ok(normalized);
        }
    }

    Err(PipelineError::schema(role, "missing identifier column"))
}

/// One recognition attempt at a fixed header offset. `None` means the
/// identifier column did not surface at this offset.
fn try_offset(table: &RawTable, role: SourceRole, offset: usize) -> Option<RawTable> {
    if offset == 0 {
        let mut saw_key = false;
        let normalized: RawTable = table
            .iter()
            .map(|row| {
                let renamed = rename_by_own_columns(row, role);
                saw_key |= renamed.get(COL_KEY).is_some();
                renamed
            })
            .collect();
        return saw_key.then_some(normalized);
    }

    // Offset k > 0: row k-1's cell values are the real column names.
    let header = table.rows().get(offset - 1)?;
    let rename: Vec<(&str, &'static str)> = header
        .iter()
        .filter_map(|(original, cell)| {
            let label = cell.to_text()?;
            canonical_for(&fold_key(&label), role).map(|canonical| (original, canonical))
        })
        .collect();

    if !rename.iter().any(|(_, canonical)| *canonical == COL_KEY) {
        return None;
    }

    let normalized = table
        .rows()
        .iter()
        .skip(offset)
        .map(|row| {
            let mut renamed = RawRow::new();
            for (original, canonical) in &rename {
                if renamed.get(canonical).is_none() {
                    if let Some(cell) = row.get(original) {
                        renamed.insert(*canonical, cell.clone());
                    }
                }
            }
            renamed
        })
        .collect();
    Some(normalized)
}

fn rename_by_own_columns(row: &RawRow, role: SourceRole) -> RawRow {
    let mut renamed = RawRow::new();
    for (original, cell) in row.iter() {
        if let Some(canonical) = canonical_for(&fold_key(original), role) {
            if renamed.get(canonical).is_none() {
                renamed.insert(canonical, cell.clone());
            }
        }
    }
    renamed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
