// src/rules/stock_flow.rs
//
// Declared stock at the end of the current period must equal the previous
// period's final stock plus the current period's item entries. Outbound
// movement is taken as zero, so this is an approximation of the real ledger.

use tracing::debug;

use super::{coercion_note, require_column, require_table, sum_column, sum_where, Category, Finding, RuleError};
use crate::config::{RuleConfiguration, RuleId};
use crate::process::{same_code, ColumnSum, PeriodDataset};

/// `MOT_INV` value for "final stock of the period".
pub const FINAL_STOCK_MOTIVE: &str = "01";

/// Float slack so that a difference of exactly the tolerance never fires.
const EPSILON: f64 = 1e-9;

fn final_stock(ds: &PeriodDataset) -> Result<ColumnSum, RuleError> {
    let h005 = require_table(ds, "H005")?;
    let value = require_column(ds, h005, "VL_INV")?;
    let motive = require_column(ds, h005, "MOT_INV")?;
    Ok(sum_where(h005, value, |row| same_code(&row[motive], FINAL_STOCK_MOTIVE)))
}

pub fn check(
    previous: &PeriodDataset,
    current: &PeriodDataset,
    cfg: &RuleConfiguration,
) -> Result<Vec<Finding>, RuleError> {
    let opening = final_stock(previous)?;
    let declared = final_stock(current)?;
    let c170 = require_table(current, "C170")?;
    let entries = sum_column(c170, require_column(current, c170, "VL_ITEM")?);

    let expected = opening.total + entries.total;
    let diff = (expected - declared.total).abs();
    debug!(opening = opening.total, entries = entries.total, declared = declared.total, diff, "stock flow");
    if diff <= cfg.thresholds.stock_flow_tolerance + EPSILON {
        return Ok(Vec::new());
    }

    let note = coercion_note(&[
        ("H005.VL_INV anterior", opening),
        ("C170.VL_ITEM", entries),
        ("H005.VL_INV atual", declared),
    ]);
    Ok(vec![Finding::new(
        RuleId::StockFlow,
        "H e C",
        "H005 / C170",
        Category::StockFlow,
        format!(
            "O estoque não fecha. Inicial: R${:.2} + Entradas: R${:.2} = Esperado: R${:.2}. Declarado: R${:.2} (diferença de R${:.2}).{}",
            opening.total, entries.total, expected, declared.total, diff, note
        ),
        "Omissão de vendas (saídas não registradas) ou erro grave no registro de entradas/inventário.",
    )])
}
