// src/rules/cancelled.rs

use super::{require_column, require_table, Category, Finding, RuleError};
use crate::config::{RuleConfiguration, RuleId};
use crate::process::{same_code, PeriodDataset};

/// `COD_SIT` for a regularly cancelled document.
pub const CANCELLED_STATUS: &str = "02";

/// Percentage of C100 rows carrying the cancelled status. Empty table → 0.
fn cancelled_share(ds: &PeriodDataset) -> Result<f64, RuleError> {
    let c100 = require_table(ds, "C100")?;
    let idx = require_column(ds, c100, "COD_SIT")?;
    if c100.is_empty() {
        return Ok(0.0);
    }
    let cancelled = c100
        .cells(idx)
        .filter(|(_, v)| same_code(v, CANCELLED_STATUS))
        .count();
    Ok(cancelled as f64 * 100.0 / c100.len() as f64)
}

pub fn check(
    previous: &PeriodDataset,
    current: &PeriodDataset,
    cfg: &RuleConfiguration,
) -> Result<Vec<Finding>, RuleError> {
    let before = cancelled_share(previous)?;
    let now = cancelled_share(current)?;
    let limit = cfg.thresholds.cancelled_ratio_max_increase;

    if now - before <= limit {
        return Ok(Vec::new());
    }

    Ok(vec![Finding::new(
        RuleId::CancelledRatio,
        "C",
        "C100",
        Category::CancelledRatio,
        format!(
            "O percentual de notas canceladas subiu de {:.2}% no período anterior para {:.2}% no período atual (aumento de {:.2} pontos percentuais, limite {:.2}).",
            before,
            now,
            now - before,
            limit
        ),
        "Cancelamento de notas após a saída da mercadoria para ocultar vendas efetivamente realizadas.",
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Thresholds;
    use crate::rules::fixtures::*;

    fn docs(statuses: &[&str]) -> Vec<String> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, s)| c100("1", s, &(i + 1).to_string()))
            .collect()
    }

    #[test]
    fn large_jump_fires_with_both_percentages() -> anyhow::Result<()> {
        let found = check(
            &dataset("anterior", &docs(&["00", "00", "00", "00"])),
            &dataset("atual", &docs(&["02", "02", "02", "00"])),
            &RuleConfiguration::default(),
        )?;
        assert_eq!(found.len(), 1);
        assert!(found[0].description.contains("0.00%"));
        assert!(found[0].description.contains("75.00%"));
        Ok(())
    }

    #[test]
    fn threshold_is_configurable() -> anyhow::Result<()> {
        let prev = dataset("anterior", &docs(&["00", "00", "00", "00"]));
        let cur = dataset("atual", &docs(&["02", "00", "00", "00"]));
        assert!(check(&prev, &cur, &RuleConfiguration::default())?.is_empty());

        let strict = RuleConfiguration {
            thresholds: Thresholds {
                cancelled_ratio_max_increase: 10.0,
                ..Thresholds::default()
            },
            ..RuleConfiguration::default()
        };
        assert_eq!(check(&prev, &cur, &strict)?.len(), 1);
        Ok(())
    }

    #[test]
    fn increase_equal_to_limit_is_silent() -> anyhow::Result<()> {
        let found = check(
            &dataset("anterior", &docs(&["00", "00"])),
            &dataset("atual", &docs(&["02", "00"])),
            &RuleConfiguration::default(),
        )?;
        assert!(found.is_empty());
        Ok(())
    }
}
