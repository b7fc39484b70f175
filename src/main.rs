use anyhow::{bail, Context, Result};
use spedcheck::{report, run_analysis, RuleConfiguration};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str =
    "usage: spedcheck <previous.txt> <current.txt> [--config regras.yaml] [--out DIR]";

struct Args {
    previous: PathBuf,
    current: PathBuf,
    config: PathBuf,
    out_dir: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut config = PathBuf::from("regras.yaml");
    let mut out_dir = PathBuf::from(".");

    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => config = it.next().map(PathBuf::from).context(USAGE)?,
            "--out" => out_dir = it.next().map(PathBuf::from).context(USAGE)?,
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    if positional.len() != 2 {
        bail!(USAGE);
    }
    let current = positional.pop().context(USAGE)?;
    let previous = positional.pop().context(USAGE)?;
    Ok(Args {
        previous,
        current,
        config,
        out_dir,
    })
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) arguments + configuration ───────────────────────────────
    let args = parse_args()?;
    let cfg = RuleConfiguration::load(&args.config)?;

    // ─── 3) parse both periods and evaluate the rules ───────────────
    let summary = run_analysis(&args.previous, &args.current, &cfg)
        .context("comparative analysis interrupted")?;
    info!(
        findings = summary.findings.len(),
        totals = ?summary.totals,
        "rules evaluated"
    );

    // ─── 4) persist the technical summary ───────────────────────────
    let path = report::write_summary(&summary, &args.out_dir)?;
    info!(path = %path.display(), "technical summary written");
    println!("{} findings → {}", summary.findings.len(), path.display());
    Ok(())
}
