use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use aws_sla_hunter::app::{run_scan, OutputMode, EXIT_CREDENTIALS, EXIT_SUCCESS};
use aws_sla_hunter::aws::{load_sdk_config, AwsHealthApi, StsIdentityProvider};
use aws_sla_hunter::config::{load_config, SystemEnvironment};
use aws_sla_hunter::credentials::{CredentialProbes, CredentialResolver};
use aws_sla_hunter::collector::EventCollector;
use aws_sla_hunter::render::TerminalRenderer;
use aws_sla_hunter::setup::{SetupWizard, StdinPrompter, SystemCommandRunner};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Output {
    /// Table, summary and panels
    Table,
    /// Normalized events as a JSON array
    Json,
}

#[derive(Parser)]
#[command(name = "aws-sla-hunter")]
#[command(about = "Find AWS Health events with potential SLA credit eligibility", long_about = None)]
#[command(version)]
struct Cli {
    /// Run the interactive credential setup wizard instead of a scan
    #[arg(long)]
    setup: bool,
    /// Output format
    #[arg(long, value_name = "OUTPUT", default_value = "table")]
    output: Output,
    /// Lookback window in days (overrides LOOKBACK_DAYS)
    #[arg(long, value_name = "DAYS", value_parser = clap::value_parser!(i64).range(1..))]
    days: Option<i64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config()?;
    let window_days = cli.days.unwrap_or(cfg.lookback_days);
    info!("health region = {}, window = {} days", cfg.health_region, window_days);

    let sdk = load_sdk_config(&cfg.health_region).await;
    let probes = CredentialProbes::new(SystemEnvironment, &cfg)
        .context("Failed to build metadata probe client")?;
    let resolver = CredentialResolver::new(StsIdentityProvider::new(&sdk), probes);
    let mut renderer = TerminalRenderer::stdout();

    if cli.setup {
        let mut wizard = SetupWizard::new(&resolver, StdinPrompter, SystemCommandRunner, cfg.env_file.clone());
        let ok = wizard.run(&mut renderer).await?;
        let code = if ok { EXIT_SUCCESS } else { EXIT_CREDENTIALS };
        return Ok(ExitCode::from(code as u8));
    }

    let health = AwsHealthApi::new(&sdk);
    let collector = EventCollector::new(&health);
    let output = match cli.output {
        Output::Table => OutputMode::Table,
        Output::Json => OutputMode::Json,
    };

    let code = run_scan(&resolver, &collector, &mut renderer, window_days, output).await?;
    Ok(ExitCode::from(code as u8))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
