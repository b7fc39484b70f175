// src/report/mod.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::process::PeriodSummary;
use crate::rules::Finding;

pub const SUMMARY_FILE: &str = "resumo_tecnico_analise.json";

/// Machine-readable outcome of one comparative run; the sole input of the
/// narrative and rendering layers.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalSummary {
    pub generated_at: DateTime<Utc>,
    pub previous: PeriodSummary,
    pub current: PeriodSummary,
    /// False when the previous file's declared range does not start before
    /// the current one's (likely swapped inputs).
    pub period_order_ok: bool,
    /// Number of findings per category label.
    pub totals: BTreeMap<String, usize>,
    pub findings: Vec<Finding>,
}

impl TechnicalSummary {
    pub fn new(
        previous: PeriodSummary,
        current: PeriodSummary,
        period_order_ok: bool,
        findings: Vec<Finding>,
    ) -> Self {
        let mut totals = BTreeMap::new();
        for f in &findings {
            *totals.entry(f.category.label().to_string()).or_insert(0) += 1;
        }
        Self {
            generated_at: Utc::now(),
            previous,
            current,
            period_order_ok,
            totals,
            findings,
        }
    }
}

/// Write `summary` as pretty JSON into `out_dir`, replacing any previous
/// summary atomically (temp file, then rename).
pub fn write_summary<P: AsRef<Path>>(summary: &TechnicalSummary, out_dir: P) -> Result<PathBuf> {
    let dir = out_dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {:?}", dir))?;

    let path = dir.join(SUMMARY_FILE);
    let tmp_path = dir.join(format!(".{}.tmp", SUMMARY_FILE));
    let mut tmp = fs::File::create(&tmp_path)
        .with_context(|| format!("creating {:?}", tmp_path))?;
    serde_json::to_writer_pretty(&mut tmp, summary).context("serializing technical summary")?;
    tmp.write_all(b"\n")?;
    tmp.sync_all()?;
    drop(tmp);

    fs::rename(&tmp_path, &path)
        .with_context(|| format!("renaming {:?} -> {:?}", tmp_path, path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleId;
    use crate::process::PeriodDataset;
    use crate::rules::Category;
    use crate::schema::BUILTIN;
    use tempfile::tempdir;

    fn finding(category: Category) -> Finding {
        Finding::new(RuleId::StockFlow, "H e C", "H005", category, "d".into(), "h")
    }

    #[test]
    fn writes_pretty_json_with_totals() -> Result<()> {
        let ds = PeriodDataset::from_text("atual", "|H005|31012024|1|01|", &BUILTIN);
        let summary = TechnicalSummary::new(
            ds.summary(),
            ds.summary(),
            false,
            vec![
                finding(Category::StockFlow),
                finding(Category::StructuralAlert),
                finding(Category::StructuralAlert),
            ],
        );
        let dir = tempdir()?;
        let path = write_summary(&summary, dir.path().join("saida"))?;
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(SUMMARY_FILE));

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(v["findings"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(v["totals"]["Alerta de Estrutura"], 2);
        assert_eq!(v["current"]["status"], "loaded");
        assert_eq!(v["current"]["stats"]["records"], 1);
        assert_eq!(v["period_order_ok"], false);
        assert_eq!(v["current"]["missing_blocks"].as_array().map(|a| a.len()), Some(5));
        assert!(!dir.path().join("saida").join(format!(".{}.tmp", SUMMARY_FILE)).exists());
        Ok(())
    }
}
