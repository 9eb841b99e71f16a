//! Configuration module for pdfgather.
//!
//! This module holds the validated, normalized configuration that drives a
//! run. It handles:
//! - Parsing of the enumerated options
//! - Output path normalization
//! - Validation of argument combinations

use std::path::{Path, PathBuf};
use std::str::FromStr;

use fancy_regex::Regex;
use serde::Serialize;

use crate::error::{PdfGatherError, Result};

/// Extension every output file ends in.
pub const OUTPUT_EXTENSION: &str = "pdf";

/// Compression applied to the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Streams are written as they were read.
    None,
    /// Uncompressed streams are deflated before writing.
    #[default]
    Standard,
}

impl FromStr for CompressionLevel {
    type Err = PdfGatherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            _ => Err(PdfGatherError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard"
            ))),
        }
    }
}

/// What to do with a document when some of its pages are unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryPolicy {
    /// Keep the readable pages and warn about the others.
    #[default]
    Salvage,
    /// Skip the whole document if any page is unreadable.
    RejectDocument,
}

impl FromStr for RecoveryPolicy {
    type Err = PdfGatherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "salvage" => Ok(Self::Salvage),
            "reject" | "reject-document" => Ok(Self::RejectDocument),
            _ => Err(PdfGatherError::invalid_config(format!(
                "Invalid page error policy: {s}. Must be one of: salvage, reject"
            ))),
        }
    }
}

/// Order in which matching files are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Digit runs compare numerically, so `L2` comes before `L10`.
    #[default]
    Natural,
    /// Plain byte-wise path order.
    Lexicographic,
}

impl FromStr for SortOrder {
    type Err = PdfGatherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "lexicographic" | "lex" => Ok(Self::Lexicographic),
            _ => Err(PdfGatherError::invalid_config(format!(
                "Invalid sort order: {s}. Must be one of: natural, lexicographic"
            ))),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Complete configuration for a pattern-driven merge.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory searched for candidate files.
    pub directory: PathBuf,

    /// Regular expression matched against file names.
    pub pattern: String,

    /// Normalized output path.
    pub output: PathBuf,

    /// Match the pattern case-insensitively.
    pub ignore_case: bool,

    /// Descend into subdirectories.
    pub recursive: bool,

    /// Candidate ordering.
    pub sort: SortOrder,

    /// Handling of partially readable documents.
    pub recovery: RecoveryPolicy,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Number of documents prepared ahead of the merge loop.
    pub jobs: usize,

    /// Validate and plan without creating output.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Print the final report as JSON.
    pub json: bool,
}

impl Config {
    /// Create a configuration with defaults for everything but the search.
    ///
    /// The output path is normalized against `directory`.
    pub fn new(
        directory: impl Into<PathBuf>,
        pattern: impl Into<String>,
        output: impl AsRef<Path>,
    ) -> Self {
        let directory = directory.into();
        let output = normalize_output_path(output.as_ref(), &directory);

        Self {
            directory,
            pattern: pattern.into(),
            output,
            ignore_case: true,
            recursive: false,
            sort: SortOrder::default(),
            recovery: RecoveryPolicy::default(),
            compression: CompressionLevel::default(),
            overwrite_mode: OverwriteMode::default(),
            jobs: 1,
            dry_run: false,
            verbose: false,
            quiet: false,
            json: false,
        }
    }

    /// Compile the filename pattern.
    ///
    /// Look-around is supported, so `^(?!L)` selects names not starting with
    /// `L`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfGatherError::InvalidPattern`] if the pattern does not compile.
    pub fn compile_pattern(&self) -> Result<Regex> {
        let pattern = if self.ignore_case {
            format!("(?i){}", self.pattern)
        } else {
            self.pattern.clone()
        };

        Regex::new(&pattern).map_err(|source| PdfGatherError::InvalidPattern {
            pattern: self.pattern.clone(),
            source,
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pattern is empty or not a valid regex
    /// - The directory does not exist or is not a directory
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    pub fn validate(&self) -> Result<()> {
        if self.pattern.is_empty() {
            return Err(PdfGatherError::invalid_config("Pattern must not be empty"));
        }

        self.compile_pattern()?;

        if !self.directory.is_dir() {
            return Err(PdfGatherError::invalid_config(format!(
                "Directory '{}' does not exist or is not a directory",
                self.directory.display()
            )));
        }

        if self.verbose && self.quiet {
            return Err(PdfGatherError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if self.jobs == 0 {
            return Err(PdfGatherError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        Ok(())
    }

    /// Check if progress output should be displayed.
    pub fn should_print(&self) -> bool {
        !self.quiet && !self.json
    }
}

/// Normalize the output path.
///
/// Gives the path the `.pdf` extension unless it already has it
/// (case-insensitively), replacing any other extension, and resolves a
/// relative path against `directory`.
///
/// # Examples
///
/// ```
/// use pdfgather::config::normalize_output_path;
/// use std::path::Path;
///
/// let out = normalize_output_path(Path::new("lectures"), Path::new("/data"));
/// assert_eq!(out, Path::new("/data/lectures.pdf"));
/// ```
pub fn normalize_output_path(output: &Path, directory: &Path) -> PathBuf {
    let has_extension = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION));

    let output = if has_extension {
        output.to_path_buf()
    } else {
        output.with_extension(OUTPUT_EXTENSION)
    };

    if output.is_absolute() {
        output
    } else {
        directory.join(output)
    }
}
