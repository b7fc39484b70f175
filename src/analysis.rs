// src/analysis.rs
//
// Whole comparative run: two files in, technical summary out.

use anyhow::Result;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::RuleConfiguration;
use crate::process::{check_period_order, load_period, PeriodDataset, SourceStatus};
use crate::report::TechnicalSummary;
use crate::rules::RuleEngine;

pub const PREVIOUS_LABEL: &str = "anterior";
pub const CURRENT_LABEL: &str = "atual";

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Nothing to compare against; the only condition that stops a run.
    #[error("period `{label}` has no data ({status:?})")]
    EmptyPeriod { label: String, status: SourceStatus },
}

/// Evaluate the engine over two already-built datasets.
pub fn analyze(
    previous: &PeriodDataset,
    current: &PeriodDataset,
    cfg: &RuleConfiguration,
    engine: &RuleEngine,
) -> Result<TechnicalSummary, AnalysisError> {
    for ds in [previous, current] {
        if ds.is_empty() {
            return Err(AnalysisError::EmptyPeriod {
                label: ds.label.clone(),
                status: ds.status.clone(),
            });
        }
    }
    let order_ok = check_period_order(previous, current);
    let findings = engine.evaluate(previous, current, cfg);
    Ok(TechnicalSummary::new(
        previous.summary(),
        current.summary(),
        order_ok,
        findings,
    ))
}

/// Load both period files and run the standard rules.
#[instrument(level = "info", skip_all, fields(previous = %previous.as_ref().display(), current = %current.as_ref().display()))]
pub fn run_analysis<P: AsRef<Path>, Q: AsRef<Path>>(
    previous: P,
    current: Q,
    cfg: &RuleConfiguration,
) -> Result<TechnicalSummary> {
    let registry = cfg.schema_registry()?;
    let (previous, current) = (previous.as_ref(), current.as_ref());
    let (prev, cur) = rayon::join(
        || load_period(PREVIOUS_LABEL, previous, &registry),
        || load_period(CURRENT_LABEL, current, &registry),
    );
    let summary = analyze(&prev, &cur, cfg, &RuleEngine::standard())?;
    info!(findings = summary.findings.len(), "analysis complete");
    Ok(summary)
}
