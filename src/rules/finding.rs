// src/rules/finding.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RuleId;

/// Closed set of inconsistency kinds. Serialized with the labels the
/// narrative layer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Inconsistência Crítica no Fluxo de Estoque")]
    StockFlow,
    #[serde(rename = "Apuração de ICMS Incompatível")]
    TaxDebit,
    #[serde(rename = "Quebra na Sequência Numérica de Notas")]
    SequenceRegression,
    #[serde(rename = "Aumento Anormal de Notas Canceladas")]
    CancelledRatio,
    #[serde(rename = "CFOP Incompatível com a Operação")]
    DirectionMismatch,
    #[serde(rename = "Crédito Indevido de ICMS em Uso e Consumo")]
    ImproperCredit,
    #[serde(rename = "Alerta de Estrutura")]
    StructuralAlert,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::StockFlow => "Inconsistência Crítica no Fluxo de Estoque",
            Category::TaxDebit => "Apuração de ICMS Incompatível",
            Category::SequenceRegression => "Quebra na Sequência Numérica de Notas",
            Category::CancelledRatio => "Aumento Anormal de Notas Canceladas",
            Category::DirectionMismatch => "CFOP Incompatível com a Operação",
            Category::ImproperCredit => "Crédito Indevido de ICMS em Uso e Consumo",
            Category::StructuralAlert => "Alerta de Estrutura",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One discrepancy emitted by a rule. Plain output value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "regra")]
    pub rule: RuleId,
    #[serde(rename = "bloco")]
    pub block: String,
    #[serde(rename = "registro")]
    pub record: String,
    #[serde(rename = "tipo_inconsistencia")]
    pub category: Category,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "irregularidade_possivel")]
    pub hypothesis: String,
}

impl Finding {
    pub fn new(
        rule: RuleId,
        block: &str,
        record: &str,
        category: Category,
        description: String,
        hypothesis: &str,
    ) -> Self {
        Self {
            rule,
            block: block.to_string(),
            record: record.to_string(),
            category,
            description,
            hypothesis: hypothesis.to_string(),
        }
    }
}
