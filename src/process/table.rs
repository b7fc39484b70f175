// src/process/table.rs

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::tokenize::{RawRecord, RecordGroup};
use crate::schema::{positional_columns, SchemaRegistry};

/// How a table's column names were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnResolution {
    /// Names come from a registered layout of matching arity.
    Schema,
    /// No layout matched; columns are `FIELD_1..FIELD_n`.
    /// `known_arities` is empty when the record type has no layout at all.
    Positional { known_arities: Vec<usize> },
}

/// All rows of one record type for one period, bound to named columns.
/// Every entry of `rows` has exactly `columns.len()` values.
#[derive(Debug, Clone)]
pub struct Table {
    pub code: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Source line of each entry in `rows`.
    pub lines: Vec<usize>,
    pub resolution: ColumnResolution,
    /// Rows whose field count differs from the first row's, kept verbatim.
    pub irregular_rows: Vec<RawRecord>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate `(source line, value)` for the column at `idx`.
    pub fn cells(&self, idx: usize) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.rows
            .iter()
            .zip(self.lines.iter())
            .map(move |(row, line)| (*line, row[idx].as_str()))
    }

    pub fn value(&self, row: usize, idx: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(idx)).map(String::as_str)
    }

    pub fn uses_schema(&self) -> bool {
        self.resolution == ColumnResolution::Schema
    }
}

/// Bind one record group to its columns. The first row fixes the arity.
pub fn build_table(group: RecordGroup, registry: &SchemaRegistry) -> Table {
    let RecordGroup { code, records } = group;
    let arity = records.first().map(|r| r.fields.len()).unwrap_or(0);

    let (columns, resolution) = match registry.resolve(&code, arity) {
        Some(schema) => (schema.fields.clone(), ColumnResolution::Schema),
        None => {
            let known_arities = registry.known_arities(&code);
            if known_arities.is_empty() {
                debug!(code = %code, arity, "no layout for record type, using positional columns");
            } else {
                warn!(
                    code = %code,
                    observed = arity,
                    expected = ?known_arities,
                    "field count matches no layout, using positional columns"
                );
            }
            (
                positional_columns(arity),
                ColumnResolution::Positional { known_arities },
            )
        }
    };

    let mut rows = Vec::with_capacity(records.len());
    let mut lines = Vec::with_capacity(records.len());
    let mut irregular_rows = Vec::new();
    for rec in records {
        if rec.fields.len() == arity {
            lines.push(rec.line);
            rows.push(rec.fields);
        } else {
            warn!(
                code = %code,
                line = rec.line,
                expected = arity,
                found = rec.fields.len(),
                "row field count differs from first row of its type"
            );
            irregular_rows.push(rec);
        }
    }

    Table {
        code,
        columns,
        rows,
        lines,
        resolution,
        irregular_rows,
    }
}

/// Build every group's table. Groups are independent, so this runs in parallel;
/// the output keeps the input order.
pub fn build_tables(groups: Vec<RecordGroup>, registry: &SchemaRegistry) -> Vec<Table> {
    groups
        .into_par_iter()
        .map(|g| build_table(g, registry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::tokenize::tokenize_str;
    use crate::schema::BUILTIN;

    fn h005_line(value: &str) -> String {
        format!("|H005|31122023|{}|01|", value)
    }

    #[test]
    fn matching_arity_gets_named_columns() {
        let text = [h005_line("10"), h005_line("20")].join("\n");
        let (groups, _) = tokenize_str(&text);
        let tables = build_tables(groups, &BUILTIN);
        let t = &tables[0];
        assert!(t.uses_schema());
        assert_eq!(t.columns, vec!["REG", "DT_INV", "VL_INV", "MOT_INV"]);
        assert_eq!(t.column_index("VL_INV"), Some(2));
        let values: Vec<(usize, &str)> = t.cells(2).collect();
        assert_eq!(values, vec![(1, "10"), (2, "20")]);
    }

    #[test]
    fn mismatched_arity_falls_back_to_positional() {
        let (groups, _) = tokenize_str("|H005|31122023|10|01|extra|");
        let t = build_table(groups.into_iter().next().unwrap(), &BUILTIN);
        assert_eq!(
            t.resolution,
            ColumnResolution::Positional {
                known_arities: vec![4]
            }
        );
        assert_eq!(t.columns, positional_columns(5));
        assert!(!t.has_column("VL_INV"));
        assert_eq!(t.rows[0].len(), 5);
    }

    #[test]
    fn unknown_type_falls_back_without_error() {
        let (groups, _) = tokenize_str("|Z999|a|b|");
        let t = build_table(groups.into_iter().next().unwrap(), &BUILTIN);
        assert_eq!(
            t.resolution,
            ColumnResolution::Positional {
                known_arities: vec![]
            }
        );
        assert_eq!(t.columns, vec!["FIELD_1", "FIELD_2", "FIELD_3"]);
    }

    #[test]
    fn irregular_rows_are_kept_aside_not_truncated() {
        let text = format!("{}\n|H005|31122023|99|01|x|y|\n{}", h005_line("1"), h005_line("2"));
        let (groups, _) = tokenize_str(&text);
        let t = build_table(groups.into_iter().next().unwrap(), &BUILTIN);
        assert_eq!(t.len(), 2);
        assert!(t.rows.iter().all(|r| r.len() == t.columns.len()));
        assert_eq!(t.irregular_rows.len(), 1);
        assert_eq!(t.irregular_rows[0].line, 2);
        assert_eq!(t.irregular_rows[0].fields.len(), 6);
        assert_eq!(t.lines, vec![1, 3]);
    }

    #[test]
    fn parallel_build_preserves_group_order() {
        let text = "|C100|a|\n|H005|1|2|3|\n|E110|x|\n|0000|y|\n";
        let (groups, _) = tokenize_str(text);
        let tables = build_tables(groups, &BUILTIN);
        let codes: Vec<&str> = tables.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["C100", "H005", "E110", "0000"]);
        assert!(tables[1].uses_schema());
    }
}
