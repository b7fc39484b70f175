use anyhow::Result;
use spedcheck::{run_analysis, write_summary, Category, RuleConfiguration, RuleId};
use std::{fs, io::Write, path::Path};
use tempfile::{tempdir, NamedTempFile};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,spedcheck=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn c100(ind_oper: &str, num_doc: &str) -> String {
    let mut f = vec![""; 26];
    f[0] = "C100";
    f[1] = ind_oper;
    f[5] = "00";
    f[8] = num_doc;
    format!("|{}|", f.join("|"))
}

fn c170(vl_item: &str, cfop: &str) -> String {
    let mut f = vec![""; 21];
    f[0] = "C170";
    f[6] = vl_item;
    f[10] = cfop;
    f[14] = "0";
    format!("|{}|", f.join("|"))
}

fn opening(start: &str, end: &str) -> String {
    format!(
        "|0000|017|0|{}|{}|EMPRESA TESTE|11222333000181||SP|123456789|3550308|||A|1|",
        start, end
    )
}

fn write_period(lines: &[String]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new()?;
    for l in lines {
        // CRLF like the exports produced on Windows workstations
        write!(tmp, "{}\r\n", l)?;
    }
    tmp.flush()?;
    Ok(tmp)
}

#[test]
fn outbound_period_with_inbound_cfop() -> Result<()> {
    init_test_logging();
    let previous = write_period(&[
        opening("01012024", "31012024"),
        c100("1", "10"),
        c170("100", "5102"),
        "|9999|".to_string(),
    ])?;
    let current = write_period(&[
        opening("01022024", "29022024"),
        c100("1", "11"),
        c170("100", "1102"),
    ])?;

    let cfg = RuleConfiguration::only(&[RuleId::OperationDirection]);
    let summary = run_analysis(previous.path(), current.path(), &cfg)?;

    assert_eq!(summary.findings.len(), 1);
    let f = &summary.findings[0];
    assert_eq!(f.category, Category::DirectionMismatch);
    assert_eq!(f.category.label(), "CFOP Incompatível com a Operação");
    assert!(f.description.contains("1102"));
    assert!(f.description.contains(" 1 item(ns)"));

    assert_eq!(summary.previous.stats.malformed_lines, 1);
    assert!(summary.current.range.is_some());
    Ok(())
}

#[test]
fn full_run_reports_structural_alerts_and_writes_summary() -> Result<()> {
    init_test_logging();
    let previous = write_period(&[opening("01012024", "31012024"), c100("1", "10")])?;
    let current = write_period(&[opening("01022024", "29022024"), c100("1", "11")])?;

    let summary = run_analysis(previous.path(), current.path(), &RuleConfiguration::default())?;
    let rules: Vec<RuleId> = summary.findings.iter().map(|f| f.rule).collect();
    // no C170/H005/E110 anywhere: four rules cannot run, the two C100-only rules stay quiet
    assert_eq!(
        rules,
        vec![
            RuleId::StockFlow,
            RuleId::TaxDebit,
            RuleId::OperationDirection,
            RuleId::ConsumptionCredit
        ]
    );
    assert!(summary
        .findings
        .iter()
        .all(|f| f.category == Category::StructuralAlert));

    let out = tempdir()?;
    let path = write_summary(&summary, out.path())?;
    let text = fs::read_to_string(&path)?;
    assert!(text.contains("\"tipo_inconsistencia\": \"Alerta de Estrutura\""));
    Ok(())
}

#[test]
fn missing_current_file_halts_the_run() -> Result<()> {
    init_test_logging();
    let previous = write_period(&[c100("1", "10")])?;
    let err = run_analysis(
        previous.path(),
        Path::new("/does/not/exist.txt"),
        &RuleConfiguration::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("atual"));
    Ok(())
}
