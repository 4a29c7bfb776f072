use anyhow::{Context, Result};
use clap::Parser;
use harvest_core::ExclusionSet;
use harvest_engine::{CsvRecordSink, Orchestrator, RunReport, TokioClock, UiDriver};
use harvest_logging::harvest_info;

use super::chromium::ChromiumSession;
use super::cli::Cli;
use super::config::AppConfig;
use super::{logging, report, session};

const FALLBACK_OUTPUT_NAME: &str = "all_chats";

pub fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log_to, cli.log_level.into());

    // Single-threaded: the per-conversation log scope is thread-local.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let profile_dir = session::profile_dir(&config, &cli.profile)?;
    harvest_info!("using browser profile {:?}", profile_dir);

    let browser = ChromiumSession::launch(&config.browser, &profile_dir, &config.url).await?;
    let outcome = harvest(&cli, &config, browser.driver()).await;
    browser.close().await;

    let run_report = outcome?;
    println!("{}", report::render(&run_report));
    match run_report.fatal {
        Some(err) => Err(anyhow::Error::new(err).context("harvest aborted")),
        None => Ok(()),
    }
}

async fn harvest(cli: &Cli, config: &AppConfig, driver: &dyn UiDriver) -> Result<RunReport> {
    let clock = TokioClock::new();
    let mut run_config = config.run_config(cli.output.clone().unwrap_or_default());
    session::wait_for_login(driver, &clock, &run_config.selectors, config).await?;

    if cli.output.is_none() {
        run_config.output_name = session::prompt_line("Export file name (without .csv):").await?;
    }
    if let Some(quota) = cli.quota {
        run_config.limits.quota = quota;
    }
    if let Some(deadline) = cli.deadline() {
        run_config.limits.deadline = Some(deadline);
    }
    if !cli.exclude.is_empty() {
        run_config.exclusions = ExclusionSet::new(config.exclusions.iter().chain(&cli.exclude));
    }
    harvest_info!(
        "harvesting up to {} conversations, {} excluded titles",
        run_config.limits.quota,
        run_config.exclusions.len()
    );

    let sink = CsvRecordSink::with_fallback_name(config.output_dir(), FALLBACK_OUTPUT_NAME);
    Ok(Orchestrator::new(driver, &clock, run_config).run(&sink).await)
}
