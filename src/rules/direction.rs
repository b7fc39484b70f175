// src/rules/direction.rs

use super::{require_column, require_table, Category, Finding, RuleError};
use crate::config::{RuleConfiguration, RuleId};
use crate::process::PeriodDataset;

/// `IND_OPER` value for an outbound operation.
pub const OUTBOUND: &str = "1";

/// CFOPs starting with 1, 2 or 3 classify inbound operations
/// (intra-state, inter-state and foreign respectively).
pub fn is_inbound_cfop(cfop: &str) -> bool {
    matches!(cfop.trim().chars().next(), Some('1'..='3'))
}

/// The first C100 of the current period defines the direction; an outbound
/// period must not carry inbound-coded items.
pub fn check(
    _previous: &PeriodDataset,
    current: &PeriodDataset,
    _cfg: &RuleConfiguration,
) -> Result<Vec<Finding>, RuleError> {
    let c100 = require_table(current, "C100")?;
    let c170 = require_table(current, "C170")?;
    let oper = require_column(current, c100, "IND_OPER")?;
    let cfop = require_column(current, c170, "CFOP")?;

    let Some(direction) = c100.value(0, oper) else {
        return Ok(Vec::new());
    };
    if direction.trim() != OUTBOUND {
        return Ok(Vec::new());
    }

    let mut inbound = c170.cells(cfop).filter(|(_, code)| is_inbound_cfop(code));
    let Some((first_line, example)) = inbound.next() else {
        return Ok(Vec::new());
    };
    let count = 1 + inbound.count();

    Ok(vec![Finding::new(
        RuleId::OperationDirection,
        "C",
        "C100 / C170",
        Category::DirectionMismatch,
        format!(
            "O período declara operação de saída (IND_OPER={} no primeiro C100), mas {} item(ns) do C170 usam CFOP de entrada (ex.: CFOP {} na linha {}).",
            OUTBOUND,
            count,
            example.trim(),
            first_line
        ),
        "Classificação fiscal incorreta da operação, podendo mascarar entradas como saídas ou gerar crédito indevido.",
    )])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures::*;

    fn run(cur: &[String]) -> Result<Vec<Finding>, RuleError> {
        check(
            &dataset("anterior", &[]),
            &dataset("atual", cur),
            &RuleConfiguration::default(),
        )
    }

    #[test]
    fn classifies_cfop_direction() {
        assert!(is_inbound_cfop("1102"));
        assert!(is_inbound_cfop("2102"));
        assert!(is_inbound_cfop(" 3102"));
        assert!(!is_inbound_cfop("5102"));
        assert!(!is_inbound_cfop("6108"));
        assert!(!is_inbound_cfop(""));
    }

    #[test]
    fn outbound_with_inbound_items_fires() -> anyhow::Result<()> {
        let found = run(&[
            c100("1", "00", "10"),
            c170("10", "5102", "0"),
            c170("10", "1102", "0"),
            c170("10", "2102", "0"),
        ])?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, Category::DirectionMismatch);
        assert!(found[0].description.contains("2 item(ns)"));
        assert!(found[0].description.contains("CFOP 1102"));
        Ok(())
    }

    #[test]
    fn only_the_first_header_decides() -> anyhow::Result<()> {
        let found = run(&[
            c100("0", "00", "10"),
            c100("1", "00", "11"),
            c170("10", "1102", "0"),
        ])?;
        assert!(found.is_empty());
        Ok(())
    }

    #[test]
    fn clean_outbound_period_is_silent() -> anyhow::Result<()> {
        assert!(run(&[c100("1", "00", "10"), c170("10", "5102", "0")])?.is_empty());
        Ok(())
    }
}
