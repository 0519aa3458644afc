//! QC-Pentest: run the attack suite against a fresh security manager and
//! print or write the report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qc_18_consensus_security::{ExportFormat, SecurityConfig};
use qc_pentest::PenetrationTester;

/// QC-Pentest: consensus security penetration tests
#[derive(Parser, Debug)]
#[command(name = "qc-pentest")]
#[command(about = "Simulate Byzantine, Sybil, Eclipse, DoS and cryptographic attacks")]
struct Args {
    /// Output format (json or csv)
    #[arg(short, long, default_value = "json")]
    format: ExportFormat,

    /// Security configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(std::env::var("QC_LOG_LEVEL").unwrap_or_else(|_| "info".into()))
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = match &args.config {
        Some(path) => SecurityConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SecurityConfig::default(),
    };

    let mut tester = PenetrationTester::new(config).context("initializing security manager")?;
    let report = tester.run_security_tests();
    info!(
        passed = report.summary.passed,
        total = report.summary.total,
        risk = %report.risk_level,
        "Suite complete"
    );

    let exported = tester.export_results(args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, exported)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), format = %args.format, "Report written");
        }
        None => println!("{}", exported),
    }
    Ok(())
}
