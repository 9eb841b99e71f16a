//! pdfgather - Merge the PDF files of a directory selected by a filename pattern.

use clap::Parser;
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pdfgather::cli::Cli;
use pdfgather::config::{Config, OverwriteMode};
use pdfgather::discovery::CandidateFinder;
use pdfgather::error::PdfGatherError;
use pdfgather::io::PdfWriter;
use pdfgather::merge::{MergeOptions, Merger};
use pdfgather::output::{
    OutputFormatter, create_formatter, display_candidates, display_event, display_report,
    report_json,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(PdfGatherError::NoCandidates.exit_code()),
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(err.exit_code());
        }
    }
}

/// Route library diagnostics to stderr.
///
/// `RUST_LOG` takes precedence; otherwise only errors are logged, or
/// everything from this crate with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "warn,pdfgather=debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Main application logic.
///
/// Returns whether a non-empty output was produced (or would be, in a dry run).
async fn run(cli: Cli) -> Result<bool, PdfGatherError> {
    let config = cli.to_config()?;
    let formatter = create_formatter(&config);

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdfgather::NAME, pdfgather::VERSION));
        formatter.blank_line();
    }

    if config.dry_run {
        formatter.info("DRY RUN MODE - No files will be created");
        formatter.blank_line();
    }

    let candidates = CandidateFinder::from_config(&config)?.find()?;

    if candidates.is_empty() {
        formatter.warning(&format!(
            "No PDF files in {} matched '{}'",
            config.directory.display(),
            config.pattern
        ));
    } else {
        formatter.info(&format!("Found {} PDF file(s) to merge", candidates.len()));
        display_candidates(&formatter, &candidates);

        if !config.dry_run {
            handle_output_overwrite(&config, &formatter).await?;
        }
    }

    let merger = Merger::new(MergeOptions::from_config(&config));
    let report = merger
        .run(&candidates, &config.output, config.dry_run, |event| {
            display_event(&formatter, event)
        })
        .await?;

    if config.json {
        println!("{}", report_json(&report)?);
    } else {
        display_report(&formatter, &report);
    }

    Ok(report.success)
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<(), PdfGatherError> {
    if !PdfWriter::new().exists(&config.output).await {
        return Ok(());
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(PdfGatherError::output_exists(config.output.clone())),
        OverwriteMode::Prompt => {
            // Nobody to ask in quiet or JSON mode.
            if formatter.is_quiet() {
                return Err(PdfGatherError::output_exists(config.output.clone()));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                config.output.display()
            ));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| PdfGatherError::other(format!("Failed to read input: {err}")))?;

            let response = response.trim().to_lowercase();
            if response == "y" || response == "yes" {
                Ok(())
            } else {
                Err(PdfGatherError::Cancelled)
            }
        }
    }
}
