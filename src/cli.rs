//! CLI argument parsing for pdfgather.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.
//!
//! # Examples
//!
//! ```no_run
//! use pdfgather::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let config = cli.to_config()?;
//! println!("Searching {} for {}", config.directory.display(), config.pattern);
//! # Ok::<(), pdfgather::PdfGatherError>(())
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{CompressionLevel, Config, OverwriteMode, RecoveryPolicy, SortOrder};
use crate::error::Result;

/// Merge every PDF in a directory whose name matches a pattern.
///
/// Matching files are merged in natural filename order. Files that cannot be
/// read are skipped with a warning; the run only fails if no page at all
/// could be merged.
#[derive(Parser, Debug)]
#[command(name = "pdfgather")]
#[command(version)]
#[command(about = "Merge PDF files selected by a filename pattern", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Regular expression matched against file names
    ///
    /// The pattern may match anywhere in the name and is case-insensitive
    /// unless --case-sensitive is given. Only files ending in .pdf are
    /// considered.
    ///
    /// Examples:
    ///   pdfgather -p 'L\d+' -o lectures
    ///   pdfgather -p '^week-0[1-4]' -d ~/course -o weeks
    ///   pdfgather -p '^(?!L).*\.pdf' -o merged_others
    #[arg(short, long, value_name = "REGEX")]
    pub pattern: String,

    /// Output file name
    ///
    /// Any extension other than ".pdf" is replaced. A relative path is
    /// resolved against the search directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Directory to search for PDF files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub directory: PathBuf,

    /// Match the pattern case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Also search subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Order in which matching files are merged
    ///
    /// - natural: numbers compare by value, so L2 comes before L10 (default)
    /// - lexicographic: plain path order
    #[arg(long, value_name = "ORDER", default_value = "natural")]
    #[arg(value_parser = ["natural", "lexicographic"])]
    pub sort: String,

    /// What to do with a document that has unreadable pages
    ///
    /// - salvage: keep the readable pages and warn about the rest (default)
    /// - reject: skip the whole document
    #[arg(long, value_name = "POLICY", default_value = "salvage")]
    #[arg(value_parser = ["salvage", "reject"])]
    pub on_page_error: String,

    /// Compression level for output PDF
    ///
    /// - none: streams are written as read
    /// - standard: uncompressed streams are deflated (default)
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard"])]
    pub compression: String,

    /// Number of documents parsed ahead of the merge
    ///
    /// Pages are always appended in file order; this only overlaps parsing.
    #[arg(short, long, value_name = "N", default_value_t = 1)]
    pub jobs: usize,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Dry run - list and validate the files without creating output
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output - show debug logs and statistics
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if an enumerated option does not parse or the
    /// resulting configuration fails validation.
    pub fn to_config(&self) -> Result<Config> {
        let mut config = Config::new(&self.directory, &self.pattern, &self.output);

        config.ignore_case = !self.case_sensitive;
        config.recursive = self.recursive;
        config.sort = SortOrder::from_str(&self.sort)?;
        config.recovery = RecoveryPolicy::from_str(&self.on_page_error)?;
        config.compression = CompressionLevel::from_str(&self.compression)?;
        config.jobs = self.jobs;
        config.overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };
        config.dry_run = self.dry_run;
        config.verbose = self.verbose;
        config.quiet = self.quiet;
        config.json = self.json;

        config.validate()?;
        Ok(config)
    }
}
