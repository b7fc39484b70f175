// src/rules/mod.rs
//
// Cross-record comparison rules over a (previous, current) pair of periods.

pub mod cancelled;
pub mod consumption;
pub mod direction;
pub mod engine;
pub mod finding;
pub mod sequence;
pub mod stock_flow;
pub mod tax_debit;

use thiserror::Error;
use tracing::warn;

use crate::process::{parse_decimal, ColumnSum, Numeric, PeriodDataset, Table};

pub use engine::{Rule, RuleEngine, RuleFn, STANDARD_RULES};
pub use finding::{Category, Finding};

/// Why a rule could not run. Messages end up inside structural-alert findings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("registro {code} ausente no período {period}")]
    MissingTable { period: String, code: String },

    #[error("coluna {column} ausente no registro {code} do período {period}")]
    MissingColumn {
        period: String,
        code: String,
        column: String,
    },
}

pub(crate) fn require_table<'a>(ds: &'a PeriodDataset, code: &str) -> Result<&'a Table, RuleError> {
    ds.table(code).ok_or_else(|| RuleError::MissingTable {
        period: ds.label.clone(),
        code: code.to_string(),
    })
}

pub(crate) fn require_column(ds: &PeriodDataset, table: &Table, column: &str) -> Result<usize, RuleError> {
    table
        .column_index(column)
        .ok_or_else(|| RuleError::MissingColumn {
            period: ds.label.clone(),
            code: table.code.clone(),
            column: column.to_string(),
        })
}

/// Coerce one cell of `table`. Non-numeric text is logged with its line.
pub(crate) fn read_amount(table: &Table, row: &[String], line: usize, idx: usize) -> Numeric {
    let n = parse_decimal(&row[idx]);
    if n == Numeric::Invalid {
        warn!(
            code = %table.code,
            column = %table.columns[idx],
            line,
            raw = %row[idx],
            "non-numeric value counted as zero"
        );
    }
    n
}

/// Sum the column at `idx` over rows accepted by `keep`, coercing each cell.
/// Non-numeric text is logged per cell; blanks are only counted.
pub(crate) fn sum_where<F>(table: &Table, idx: usize, keep: F) -> ColumnSum
where
    F: Fn(&[String]) -> bool,
{
    let mut sum = ColumnSum::default();
    for (row, line) in table.rows.iter().zip(table.lines.iter()) {
        if keep(row.as_slice()) {
            sum.add(read_amount(table, row, *line, idx));
        }
    }
    sum
}

pub(crate) fn sum_column(table: &Table, idx: usize) -> ColumnSum {
    sum_where(table, idx, |_| true)
}

/// Suffix for descriptions when coerced text went into a total.
pub(crate) fn coercion_note(parts: &[(&str, ColumnSum)]) -> String {
    let flagged: Vec<String> = parts
        .iter()
        .filter(|(_, s)| s.invalid > 0)
        .map(|(name, s)| format!("{} em {}", s.invalid, name))
        .collect();
    if flagged.is_empty() {
        String::new()
    } else {
        format!(
            " Atenção: valores não numéricos tratados como zero ({}).",
            flagged.join(", ")
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for synthetic ledger lines used across rule tests.

    use crate::process::PeriodDataset;
    use crate::schema::BUILTIN;

    pub fn dataset(label: &str, lines: &[String]) -> PeriodDataset {
        PeriodDataset::from_text(label, &lines.join("\n"), &BUILTIN)
    }

    pub fn h005(value: &str, motive: &str) -> String {
        format!("|H005|31012024|{}|{}|", value, motive)
    }

    /// 26-field C100 with the given direction, status and number.
    pub fn c100(ind_oper: &str, cod_sit: &str, num_doc: &str) -> String {
        let mut f = vec![""; 26];
        f[0] = "C100";
        f[1] = ind_oper;
        f[2] = "0";
        f[4] = "55";
        f[5] = cod_sit;
        f[6] = "1";
        f[8] = num_doc;
        format!("|{}|", f.join("|"))
    }

    /// 29-field C100 as laid out by the EFD ICMS/IPI guide (no `SUB`).
    pub fn c100_efd(ind_oper: &str, cod_sit: &str, num_doc: &str) -> String {
        let mut f = vec![""; 29];
        f[0] = "C100";
        f[1] = ind_oper;
        f[2] = "0";
        f[4] = "55";
        f[5] = cod_sit;
        f[6] = "1";
        f[7] = num_doc;
        format!("|{}|", f.join("|"))
    }

    /// 21-field C170 with the given item value, CFOP and ICMS value.
    pub fn c170(vl_item: &str, cfop: &str, vl_icms: &str) -> String {
        let mut f = vec![""; 21];
        f[0] = "C170";
        f[1] = "1";
        f[2] = "ITEM";
        f[6] = vl_item;
        f[10] = cfop;
        f[14] = vl_icms;
        format!("|{}|", f.join("|"))
    }

    /// 15-field E110 with the declared debit total.
    pub fn e110(vl_tot_debitos: &str) -> String {
        let mut f = vec!["0"; 15];
        f[0] = "E110";
        f[1] = vl_tot_debitos;
        format!("|{}|", f.join("|"))
    }
}
