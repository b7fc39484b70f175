// src/rules/consumption.rs

use super::{coercion_note, read_amount, require_column, require_table, Category, Finding, RuleError};
use crate::config::{RuleConfiguration, RuleId};
use crate::process::{ColumnSum, PeriodDataset};

/// CFOPs for acquisitions of goods for use or consumption, which do not
/// grant ICMS credit.
pub const CONSUMPTION_CFOPS: &[&str] = &["1407", "1556", "2407", "2556", "3556"];

pub fn check(
    _previous: &PeriodDataset,
    current: &PeriodDataset,
    _cfg: &RuleConfiguration,
) -> Result<Vec<Finding>, RuleError> {
    let c170 = require_table(current, "C170")?;
    let cfop = require_column(current, c170, "CFOP")?;
    let icms = require_column(current, c170, "VL_ICMS")?;

    // every consumption item is read; only positive amounts count as credit
    let mut seen = ColumnSum::default();
    let mut count = 0usize;
    let mut credited = 0.0f64;
    for (row, line) in c170.rows.iter().zip(c170.lines.iter()) {
        if !CONSUMPTION_CFOPS.contains(&row[cfop].trim()) {
            continue;
        }
        let n = read_amount(c170, row, *line, icms);
        seen.add(n);
        if let Some(v) = n.value().filter(|v| *v > 0.0) {
            count += 1;
            credited += v;
        }
    }

    if count == 0 {
        return Ok(Vec::new());
    }

    Ok(vec![Finding::new(
        RuleId::ConsumptionCredit,
        "C",
        "C170",
        Category::ImproperCredit,
        format!(
            "{} item(ns) com CFOP de uso e consumo ({}) apresentam ICMS destacado, somando R${:.2} de crédito.{}",
            count,
            CONSUMPTION_CFOPS.join(", "),
            credited,
            coercion_note(&[("C170.VL_ICMS", seen)])
        ),
        "Aproveitamento indevido de crédito de ICMS sobre material de uso e consumo.",
    )])
}
