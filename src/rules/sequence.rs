// src/rules/sequence.rs

use tracing::debug;

use super::{require_column, require_table, Category, Finding, RuleError};
use crate::config::{RuleConfiguration, RuleId};
use crate::process::{PeriodDataset, Table};

/// Document numbers that are not plain unsigned integers are skipped, so they
/// can never pull the minimum down or the maximum up.
fn document_numbers(table: &Table, idx: usize) -> impl Iterator<Item = u64> + '_ {
    table.cells(idx).filter_map(|(line, raw)| match raw.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!(line, raw, "ignoring non-numeric document number");
            None
        }
    })
}

pub fn check(
    previous: &PeriodDataset,
    current: &PeriodDataset,
    _cfg: &RuleConfiguration,
) -> Result<Vec<Finding>, RuleError> {
    let prev = require_table(previous, "C100")?;
    let cur = require_table(current, "C100")?;
    let prev_idx = require_column(previous, prev, "NUM_DOC")?;
    let cur_idx = require_column(current, cur, "NUM_DOC")?;

    let (Some(prev_max), Some(cur_min)) = (
        document_numbers(prev, prev_idx).max(),
        document_numbers(cur, cur_idx).min(),
    ) else {
        return Ok(Vec::new());
    };

    if cur_min >= prev_max {
        return Ok(Vec::new());
    }

    Ok(vec![Finding::new(
        RuleId::DocumentSequence,
        "C",
        "C100",
        Category::SequenceRegression,
        format!(
            "A numeração de notas regrediu. O número máximo no período anterior foi {} e o mínimo no período atual foi {}.",
            prev_max, cur_min
        ),
        "Pode indicar omissão de notas fiscais (a lacuna entre os números não foi declarada) ou reinício indevido de série.",
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;

    fn run(prev: &[&str], cur: &[&str]) -> Vec<Finding> {
        let lines = |nums: &[&str]| -> Vec<String> { nums.iter().map(|n| c100("1", "00", n)).collect() };
        check(
            &dataset("anterior", &lines(prev)),
            &dataset("atual", &lines(cur)),
            &RuleConfiguration::default(),
        )
        .expect("C100 present on both sides")
    }

    #[test]
    fn equal_boundary_is_continuous() {
        assert!(run(&["98", "100"], &["100", "101"]).is_empty());
    }

    #[test]
    fn regression_cites_both_numbers() {
        let found = run(&["98", "100"], &["99", "102"]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, Category::SequenceRegression);
        assert!(found[0].description.contains("foi 100 e"));
        assert!(found[0].description.contains("foi 99."));
    }

    #[test]
    fn non_numeric_numbers_never_cause_regression() {
        assert!(run(&["100", "ABC"], &["", "101", "X-1"]).is_empty());
        assert!(run(&["ABC"], &["1"]).is_empty());
        assert!(run(&["000000050"], &["000000049"]).len() == 1);
    }

    #[test]
    fn guide_layout_headers_are_compared_by_name() {
        let prev = dataset("anterior", &[c100_efd("1", "00", "300")]);
        let cur = dataset("atual", &[c100_efd("1", "00", "250")]);
        assert!(cur.table("C100").map(|t| t.uses_schema()).unwrap_or(false));
        let found = check(&prev, &cur, &RuleConfiguration::default()).expect("C100 present");
        assert_eq!(found.len(), 1);
        assert!(found[0].description.contains("foi 300 e"));
    }
}
