// src/rules/tax_debit.rs

use super::{coercion_note, require_column, require_table, sum_column, Category, Finding, RuleError};
use crate::config::{RuleConfiguration, RuleId};
use crate::process::PeriodDataset;

/// Item-level ICMS is positive while the E110 summary declares exactly zero debits.
/// Any other combination, including a plain mismatch, is out of scope for this rule.
pub fn check(
    _previous: &PeriodDataset,
    current: &PeriodDataset,
    _cfg: &RuleConfiguration,
) -> Result<Vec<Finding>, RuleError> {
    let c170 = require_table(current, "C170")?;
    let e110 = require_table(current, "E110")?;
    let items = sum_column(c170, require_column(current, c170, "VL_ICMS")?);
    let declared = sum_column(e110, require_column(current, e110, "VL_TOT_DEBITOS")?);

    if !(items.total > 0.0 && declared.total == 0.0) {
        return Ok(Vec::new());
    }

    let note = coercion_note(&[("C170.VL_ICMS", items), ("E110.VL_TOT_DEBITOS", declared)]);
    Ok(vec![Finding::new(
        RuleId::TaxDebit,
        "E e C",
        "E110 / C170",
        Category::TaxDebit,
        format!(
            "A soma do ICMS nos itens (C170) é de R${:.2}, mas o total de débitos declarado no E110 é R${:.2}.{}",
            items.total, declared.total, note
        ),
        "Débito de imposto omitido, levando ao não recolhimento do ICMS devido.",
    )])
}
