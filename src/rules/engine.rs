// src/rules/engine.rs

use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

use super::{cancelled, consumption, direction, sequence, stock_flow, tax_debit};
use super::{Category, Finding, RuleError};
use crate::config::{RuleConfiguration, RuleId};
use crate::process::PeriodDataset;

/// (previous, current, configuration) → findings. Rules read their inputs only.
pub type RuleFn =
    fn(&PeriodDataset, &PeriodDataset, &RuleConfiguration) -> Result<Vec<Finding>, RuleError>;

#[derive(Clone, Copy)]
pub struct Rule {
    pub id: RuleId,
    /// Block label used when the rule degrades to a structural alert.
    pub block: &'static str,
    pub title: &'static str,
    pub check: RuleFn,
}

/// The canonical rules, in the order their findings are reported.
pub const STANDARD_RULES: [Rule; 6] = [
    Rule {
        id: RuleId::StockFlow,
        block: "H e C",
        title: "fluxo de estoque",
        check: stock_flow::check,
    },
    Rule {
        id: RuleId::TaxDebit,
        block: "E e C",
        title: "apuração de ICMS",
        check: tax_debit::check,
    },
    Rule {
        id: RuleId::DocumentSequence,
        block: "C",
        title: "sequência numérica de notas",
        check: sequence::check,
    },
    Rule {
        id: RuleId::CancelledRatio,
        block: "C",
        title: "percentual de notas canceladas",
        check: cancelled::check,
    },
    Rule {
        id: RuleId::OperationDirection,
        block: "C",
        title: "CFOP x tipo de operação",
        check: direction::check,
    },
    Rule {
        id: RuleId::ConsumptionCredit,
        block: "C",
        title: "crédito em uso e consumo",
        check: consumption::check,
    },
];

impl Rule {
    fn structural_alert(&self, record: &str, reason: &str) -> Finding {
        Finding::new(
            self.id,
            self.block,
            record,
            Category::StructuralAlert,
            format!("Não foi possível validar {}: {}.", self.title, reason),
            "Arquivo SPED com estrutura incompleta ou leiaute não reconhecido.",
        )
    }

    /// Run the rule. Precondition failures and panics become one structural alert.
    pub fn run(
        &self,
        previous: &PeriodDataset,
        current: &PeriodDataset,
        cfg: &RuleConfiguration,
    ) -> Vec<Finding> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.check)(previous, current, cfg)));
        match outcome {
            Ok(Ok(findings)) => {
                debug!(rule = %self.id, findings = findings.len(), "rule finished");
                findings
            }
            Ok(Err(e)) => {
                warn!(rule = %self.id, error = %e, "rule precondition missing");
                let record = match &e {
                    RuleError::MissingTable { code, .. } | RuleError::MissingColumn { code, .. } => {
                        code.clone()
                    }
                };
                vec![self.structural_alert(&record, &e.to_string())]
            }
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "erro interno".to_string());
                error!(rule = %self.id, panic = %msg, "rule panicked");
                vec![self.structural_alert("-", &format!("falha interna na regra ({})", msg))]
            }
        }
    }
}

/// Ordered set of independent rules evaluated against two periods.
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn standard() -> Self {
        Self::with_rules(STANDARD_RULES.to_vec())
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate every enabled rule. Rules run in parallel; the result lists
    /// each rule's findings in rule order, whatever the completion order.
    pub fn evaluate(
        &self,
        previous: &PeriodDataset,
        current: &PeriodDataset,
        cfg: &RuleConfiguration,
    ) -> Vec<Finding> {
        let per_rule: Vec<Vec<Finding>> = self
            .rules
            .par_iter()
            .filter(|r| cfg.is_enabled(r.id))
            .map(|r| r.run(previous, current, cfg))
            .collect();
        let findings: Vec<Finding> = per_rule.into_iter().flatten().collect();
        info!(findings = findings.len(), "rule evaluation complete");
        findings
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::standard()
    }
}
