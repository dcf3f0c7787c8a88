use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use log::LevelFilter;
use slotwatch_engine::{
    ChromiumOpener, Delivery, HttpOpener, HttpSettings, Pipeline, RunOutcome, SessionOpener,
    SmtpNotifier,
};

use super::cli::{Backend, Cli};
use super::config::{FileConfig, Secrets};
use super::logging::{self, LogDestination};

/// Exit status for configuration problems caught before any network activity.
const EXIT_CONFIG: u8 = 2;

pub fn run_app() -> ExitCode {
    let cli = Cli::parse();

    let destination = match cli.log_file.clone() {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(destination, level);

    let pipeline = match prepare(&cli) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            engine_error!("configuration error: {:#}", err);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let opener: Box<dyn SessionOpener> = match cli.backend {
        Backend::Chromium => Box::new(ChromiumOpener::new(cli.chrome_path.clone())),
        Backend::Http => Box::new(HttpOpener::new(HttpSettings::default())),
    };

    match execute(&pipeline, opener.as_ref()) {
        Ok(outcome) => {
            report(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Everything that must succeed before the first request goes out.
fn prepare(cli: &Cli) -> anyhow::Result<Pipeline> {
    let secrets = Secrets::from_env()?;
    let config = FileConfig::load(cli.config.as_deref())?;
    let notifier =
        SmtpNotifier::new(&config.mail_settings(secrets)).context("invalid mail settings")?;
    Ok(Pipeline::new(config.watch_settings(), Box::new(notifier)))
}

fn execute(pipeline: &Pipeline, opener: &dyn SessionOpener) -> anyhow::Result<RunOutcome> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    engine_info!("starting run");
    runtime
        .block_on(pipeline.run(opener))
        .context("could not open a page session")
}

fn report(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::NoLinksFound(failure) => {
            engine_info!("run finished ({}): {}", outcome.label(), failure);
        }
        RunOutcome::CompletedEmpty { probed } => {
            engine_info!(
                "run finished ({}): {} activities checked, all full",
                outcome.label(),
                probed
            );
        }
        RunOutcome::CompletedWithResults {
            probed,
            report,
            delivery,
        } => {
            let delivered = match delivery {
                Delivery::Sent => "alert sent",
                Delivery::Failed(_) => "alert lost",
            };
            engine_info!(
                "run finished ({}): {} of {} activities open, {}",
                outcome.label(),
                report.len(),
                probed,
                delivered
            );
        }
    }
}
