// src/config/mod.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, fs, io, path::Path};
use tracing::info;

use crate::schema::{SchemaRegistry, BUILTIN};

/// Identifiers of the comparison rules, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    StockFlow,
    TaxDebit,
    DocumentSequence,
    CancelledRatio,
    OperationDirection,
    ConsumptionCredit,
}

impl RuleId {
    pub const ALL: [RuleId; 6] = [
        RuleId::StockFlow,
        RuleId::TaxDebit,
        RuleId::DocumentSequence,
        RuleId::CancelledRatio,
        RuleId::OperationDirection,
        RuleId::ConsumptionCredit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::StockFlow => "stock_flow",
            RuleId::TaxDebit => "tax_debit",
            RuleId::DocumentSequence => "document_sequence",
            RuleId::CancelledRatio => "cancelled_ratio",
            RuleId::OperationDirection => "operation_direction",
            RuleId::ConsumptionCredit => "consumption_credit",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_stock_flow_tolerance() -> f64 {
    0.01
}

fn default_cancelled_ratio_max_increase() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    /// Absolute slack, in currency units, for the stock-flow equation.
    #[serde(default = "default_stock_flow_tolerance")]
    pub stock_flow_tolerance: f64,
    /// Largest accepted rise, in percentage points, of the cancelled-document share.
    #[serde(default = "default_cancelled_ratio_max_increase")]
    pub cancelled_ratio_max_increase: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stock_flow_tolerance: default_stock_flow_tolerance(),
            cancelled_ratio_max_increase: default_cancelled_ratio_max_increase(),
        }
    }
}

impl Thresholds {
    /// Both limits must be finite and non-negative; a NaN limit would make
    /// every comparison fire.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("stock_flow_tolerance", self.stock_flow_tolerance),
            ("cancelled_ratio_max_increase", self.cancelled_ratio_max_increase),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("threshold `{}` must be a finite, non-negative number (got {})", name, value);
            }
        }
        Ok(())
    }
}

/// Rule flags, thresholds and extra record layouts. Loaded once, then only read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfiguration {
    /// Rules absent from the map are enabled.
    #[serde(default)]
    pub rules: BTreeMap<RuleId, bool>,
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Record code → additional layouts (field-name lists, `REG` first).
    #[serde(default)]
    pub schemas: BTreeMap<String, Vec<Vec<String>>>,
}

impl RuleConfiguration {
    pub fn is_enabled(&self, rule: RuleId) -> bool {
        self.rules.get(&rule).copied().unwrap_or(true)
    }

    /// Every rule switched off; handy as a base for enabling a subset.
    pub fn none_enabled() -> Self {
        Self {
            rules: RuleId::ALL.iter().map(|r| (*r, false)).collect(),
            ..Self::default()
        }
    }

    pub fn only(rules: &[RuleId]) -> Self {
        let mut cfg = Self::none_enabled();
        for r in rules {
            cfg.rules.insert(*r, true);
        }
        cfg
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text).context("parsing rule configuration")?;
        cfg.thresholds.validate()?;
        Ok(cfg)
    }

    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let cfg = Self::from_yaml_str(&text)
                    .with_context(|| format!("in {}", path.display()))?;
                info!(path = %path.display(), "loaded rule configuration");
                Ok(cfg)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no rule configuration, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// The builtin registry extended with the layouts from `schemas`.
    pub fn schema_registry(&self) -> Result<SchemaRegistry> {
        BUILTIN
            .with_layouts(&self.schemas)
            .context("registering configured layouts")
    }
}
