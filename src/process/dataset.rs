// src/process/dataset.rs

use chrono::NaiveDate;
use serde::Serialize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use super::table::{build_tables, ColumnResolution, Table};
use super::tokenize::{tokenize_file, tokenize_str, ParseStats, RecordGroup, SourceStatus};
use crate::schema::SchemaRegistry;

/// Record types a complete ledger always carries: opening, document headers
/// and items, inventory, and the chart of accounts.
pub const MANDATORY_BLOCKS: &[&str] = &["0000", "C100", "C170", "H005", "H010", "0500"];

/// Reporting interval declared in the `0000` opening record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// All tables of one reporting period. Read-only once built.
#[derive(Debug, Clone)]
pub struct PeriodDataset {
    pub label: String,
    pub source: Option<PathBuf>,
    pub status: SourceStatus,
    pub stats: ParseStats,
    pub range: Option<PeriodRange>,
    tables: Vec<Table>,
    index: HashMap<String, usize>,
}

/// Serializable digest of a dataset for the technical summary.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub label: String,
    pub source: Option<PathBuf>,
    #[serde(flatten)]
    pub status: SourceStatus,
    pub range: Option<PeriodRange>,
    pub stats: ParseStats,
    pub record_types: usize,
    /// Record types bound to positional columns.
    pub positional_tables: Vec<String>,
    pub irregular_rows: usize,
    /// Entries of [`MANDATORY_BLOCKS`] with no record in the file.
    pub missing_blocks: Vec<String>,
}

impl PeriodDataset {
    fn assemble(
        label: &str,
        source: Option<PathBuf>,
        status: SourceStatus,
        stats: ParseStats,
        groups: Vec<RecordGroup>,
        registry: &SchemaRegistry,
    ) -> Self {
        let tables = build_tables(groups, registry);
        let index = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.code.clone(), i))
            .collect();
        let mut ds = Self {
            label: label.to_string(),
            source,
            status,
            stats,
            range: None,
            tables,
            index,
        };
        ds.range = ds.declared_range();
        ds
    }

    /// Build a dataset from in-memory text.
    pub fn from_text(label: &str, text: &str, registry: &SchemaRegistry) -> Self {
        let (groups, stats) = tokenize_str(text);
        Self::assemble(label, None, SourceStatus::Loaded, stats, groups, registry)
    }

    pub fn table(&self, code: &str) -> Option<&Table> {
        self.index.get(code).map(|&i| &self.tables[i])
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// True when nothing could be loaded: missing file, unreadable file, or no records.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn declared_range(&self) -> Option<PeriodRange> {
        let t = self.table("0000")?;
        let (s, e) = (t.column_index("DT_INI")?, t.column_index("DT_FIN")?);
        let start = NaiveDate::parse_from_str(t.value(0, s)?.trim(), "%d%m%Y").ok()?;
        let end = NaiveDate::parse_from_str(t.value(0, e)?.trim(), "%d%m%Y").ok()?;
        Some(PeriodRange { start, end })
    }

    /// Mandatory record types absent from this period, in [`MANDATORY_BLOCKS`] order.
    pub fn missing_blocks(&self) -> Vec<String> {
        MANDATORY_BLOCKS
            .iter()
            .copied()
            .filter(|code| self.table(code).is_none())
            .map(|code| code.to_string())
            .collect()
    }

    pub fn summary(&self) -> PeriodSummary {
        PeriodSummary {
            label: self.label.clone(),
            source: self.source.clone(),
            status: self.status.clone(),
            range: self.range,
            stats: self.stats.clone(),
            record_types: self.tables.len(),
            positional_tables: self
                .tables
                .iter()
                .filter(|t| matches!(t.resolution, ColumnResolution::Positional { .. }))
                .map(|t| t.code.clone())
                .collect(),
            irregular_rows: self.tables.iter().map(|t| t.irregular_rows.len()).sum(),
            missing_blocks: self.missing_blocks(),
        }
    }
}

/// Tokenize `path` and build its tables. Missing or unreadable files give
/// an empty dataset carrying the failure status.
#[instrument(level = "info", skip(path, registry), fields(path = %path.as_ref().display()))]
pub fn load_period<P: AsRef<Path>>(label: &str, path: P, registry: &SchemaRegistry) -> PeriodDataset {
    let parsed = tokenize_file(path);
    let ds = PeriodDataset::assemble(
        label,
        Some(parsed.source),
        parsed.status,
        parsed.stats,
        parsed.groups,
        registry,
    );
    info!(
        label,
        tables = ds.tables.len(),
        range = ?ds.range,
        "period loaded"
    );
    // an empty period is reported on its own; listing every block adds nothing
    if !ds.is_empty() {
        let missing = ds.missing_blocks();
        if !missing.is_empty() {
            warn!(label, missing = %missing.join(", "), "mandatory record types absent");
        }
    }
    ds
}

/// Warns when the "previous" file does not start before the "current" one.
/// Returns whether the order looks right; unknown ranges count as right.
pub fn check_period_order(previous: &PeriodDataset, current: &PeriodDataset) -> bool {
    match (previous.range, current.range) {
        (Some(p), Some(c)) if p.start >= c.start => {
            warn!(
                previous_start = %p.start,
                current_start = %c.start,
                "previous period does not precede current period; files may be swapped"
            );
            false
        }
        _ => true,
    }
}
