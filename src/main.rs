//! survey-synth - persona-driven synthetic survey responses
//!
//! Entry point: parses the command line, loads configuration, sets up
//! logging and dispatches to the generation, summary and maintenance
//! commands.

mod cli;
mod config;
mod error;
mod logging;
mod sink;
mod survey;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::config::{LoggingSettings, SinkKind, SynthConfig};
use crate::error::{Error, Result};
use crate::sink::{MemorySink, RecordSink, RestSink, Table};
use crate::survey::statistics::{
    aggregate_by_construct, frequency_distribution, render_construct_table,
};
use crate::survey::{SubmissionReport, SurveyCatalog, SurveyRng};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { subcommand } = &cli.command {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            ..Default::default()
        };
        let _log_guards = logging::init_logging(&settings, cli.verbose, cli.quiet)?;
        return handle_config_command(subcommand.clone());
    }

    let mut config = SynthConfig::load(cli.command.config_path())?;
    if let Commands::Generate { seed: Some(seed), .. } = cli.command {
        config.generation.seed = seed;
    }

    // Held until the end of the run so the file writer flushes
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        seed = config.generation.seed,
        sink = %config.sink.kind,
        "Starting survey-synth"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("survey-synth")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Generate { dry_run, .. } => run_generate(&config, dry_run).await,
            Commands::Summary { .. } => run_summary(&config).await,
            Commands::Clear { yes, .. } => run_clear(&config, yes).await,
            Commands::Config { .. } => Ok(()),
        }
    })
}

/// Generate the whole population and write it bundle by bundle.
async fn run_generate(config: &SynthConfig, dry_run: bool) -> Result<()> {
    let plan = config.generation.plan();
    let catalog = SurveyCatalog::standard();
    let mut rng = SurveyRng::new(config.generation.seed);

    let bundles = survey::generate(&plan, &catalog, &mut rng)?;

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_ctrl_c_watcher(cancel.clone());

    if dry_run || config.sink.kind == SinkKind::Memory {
        let sink = MemorySink::new();
        let options = config.submission.options_for(SinkKind::Memory);
        let report = survey::submit(&bundles, &sink, &options, &cancel).await;
        print_report(&report, sink.name());

        let aggregates = aggregate_by_construct(
            &sink.rows(Table::RatingResponses),
            &sink.rows(Table::Respondents),
            &catalog,
        )?;
        println!();
        print!("{}", render_construct_table(&aggregates));
        return finish(&report);
    }

    let sink = RestSink::new(&config.sink)?;
    let options = config.submission.options_for(config.sink.kind);
    let report = survey::submit(&bundles, &sink, &options, &cancel).await;
    print_report(&report, sink.name());
    finish(&report)
}

/// Read back what the data service holds and print the construct table.
async fn run_summary(config: &SynthConfig) -> Result<()> {
    let sink = remote_sink(config, "summary")?;
    let catalog = SurveyCatalog::standard();

    let respondents = sink.select(Table::Respondents).await?;
    let ratings = sink.select(Table::RatingResponses).await?;
    info!(
        respondents = respondents.len(),
        ratings = ratings.len(),
        "Loaded responses"
    );

    if respondents.is_empty() {
        println!("No respondents in {}.", Table::Respondents);
        return Ok(());
    }

    let aggregates = aggregate_by_construct(&ratings, &respondents, &catalog)?;
    println!("{} respondents, {} ratings", respondents.len(), ratings.len());

    let values: Vec<u8> = ratings
        .iter()
        .filter_map(|r| r.get("value").and_then(|v| v.as_u64()))
        .filter_map(|v| u8::try_from(v).ok())
        .collect();
    let dist = frequency_distribution(&values);
    println!(
        "Rating distribution (1-7): {}",
        dist.iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" / ")
    );
    println!();
    print!("{}", render_construct_table(&aggregates));
    Ok(())
}

/// Report row counts, then delete children before respondents.
async fn run_clear(config: &SynthConfig, yes: bool) -> Result<()> {
    let sink = remote_sink(config, "clear")?;

    for table in Table::delete_order() {
        let rows = sink.select(*table).await?;
        println!("{:<22} {:>6} rows", table.name(), rows.len());
    }

    if !yes {
        println!();
        println!("Nothing deleted. Re-run with --yes to delete all rows.");
        return Ok(());
    }

    for table in Table::delete_order() {
        sink.delete_all(*table).await?;
        info!(table = %table, "Cleared table");
    }
    println!();
    println!("All tables cleared.");
    Ok(())
}

/// Commands that read back stored data need a persistent sink.
fn remote_sink(config: &SynthConfig, command: &str) -> Result<RestSink> {
    match config.sink.kind {
        SinkKind::Rest => RestSink::new(&config.sink),
        SinkKind::Memory => Err(Error::NotSupported(format!(
            "`{}` needs the rest sink; the memory sink keeps nothing between runs \
             (use `generate --dry-run` for an in-memory summary)",
            command
        ))),
    }
}

/// Stop submitting further bundles on Ctrl-C.
fn spawn_ctrl_c_watcher(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current bundle");
            cancel.store(true, Ordering::SeqCst);
        }
    });
}

fn print_report(report: &SubmissionReport, sink: &str) {
    println!(
        "Submitted {} of {} bundles to the {} sink in {:.2}s",
        report.submitted,
        report.attempted() + report.skipped,
        sink,
        report.elapsed.as_secs_f64()
    );
    if !report.failed.is_empty() {
        println!("Failed bundles ({}):", report.failed.len());
        for failed in &report.failed {
            let note = if failed.left_partial {
                " (partially written)"
            } else if failed.retryable {
                " (retryable)"
            } else {
                ""
            };
            println!(
                "  #{:<4} {} {:<12} {}{}",
                failed.index + 1,
                failed.respondent_id,
                failed.stakeholder,
                failed.error,
                note
            );
        }
    }
    if report.cancelled {
        println!("Cancelled: {} bundles not submitted", report.skipped);
    }
}

/// A run with failed bundles exits non-zero; cancellation does not.
fn finish(report: &SubmissionReport) -> Result<()> {
    if report.failed.is_empty() {
        return Ok(());
    }
    Err(Error::Sink(format!(
        "{} of {} bundles failed",
        report.failed.len(),
        report.attempted()
    )))
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = SynthConfig::load(config.as_deref())?;
            print!("{}", cfg.to_display_toml()?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            SynthConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
