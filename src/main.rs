use clap::{Parser, Subcommand};
use familienpass::config::env_loader::load_config;
use familienpass::config::model::Config;
use familienpass::export::calendar::create_calendar;
use familienpass::export::reminder::{log_dry_run, read_reminders, write_reminders};
use familienpass::familienpass::scrape::run_scraper;
use familienpass::fetcher::HttpFetcher;
use familienpass::tracing::setup_tracing;
use std::error::Error;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(about = "Scrapes Familienpass events into a spreadsheet and exports selected ones")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape all events into the events spreadsheet, keeping previous selections
    Scrape,
    /// Create a calendar with the sign-up periods of the selected events
    Calendar,
    /// Create reminders for the sign-up start of the selected events
    Reminders {
        /// Only print the reminders that would be created
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let loki = setup_tracing().await;

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = tokio::select! {
        result = run(cli.command, &config) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user. Exiting without writing anything...");
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("FATAL: {}", err);
            ExitCode::FAILURE
        }
    };

    if let Some((controller, handle)) = loki {
        controller.shutdown().await;
        let _ = handle.await;
    }

    exit_code
}

async fn run(command: Command, config: &Config) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Scrape => {
            let fetcher = HttpFetcher::new(&config.http)?;
            let summary = run_scraper(config, &fetcher).await?;

            info!(
                "Success! Scraped {} event occurrences ({} unique events), kept {} selections",
                summary.occurrences, summary.unique_events, summary.carried_selections
            );
            info!("Output saved to: {}", summary.output_path.display());
        }
        Command::Calendar => {
            let summary = create_calendar(
                &config.output.events_path(),
                &config.output.continuation_marker,
                &config.output.calendar_path(),
            )?;

            match summary.output_path {
                Some(path) => info!(
                    "Total events: {}, skipped (no date): {}, saved to {}",
                    summary.created,
                    summary.skipped,
                    path.display()
                ),
                None => info!(
                    "No events to create. Please mark events in the 'Selected' column of the spreadsheet."
                ),
            }
        }
        Command::Reminders { dry_run } => {
            let reminders = read_reminders(
                &config.output.events_path(),
                &config.output.continuation_marker,
            )?;

            if reminders.is_empty() {
                info!(
                    "No events to create reminders for. Please mark events in the 'Selected' column of the spreadsheet."
                );
            } else if dry_run {
                log_dry_run(&reminders);
            } else {
                write_reminders(&reminders, &config.output.reminders_path())?;
            }
        }
    }

    Ok(())
}
