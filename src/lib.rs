//! pdfgather - Merge the PDF files of a directory selected by a filename pattern.
//!
//! This library selects PDF documents by regular expression, merges them in a
//! deterministic order into one output document, and tolerates individual
//! malformed inputs without aborting the whole job. It provides:
//!
//! - Candidate discovery with natural filename ordering
//! - Per-file validation with classified failures
//! - Page extraction with partial recovery of damaged documents
//! - Object renumbering into one collision-free output object space
//! - Atomic output writing and a structured report
//!
//! # Examples
//!
//! ## Pattern-driven merge
//!
//! ```no_run
//! use pdfgather::config::Config;
//! use pdfgather::discovery::CandidateFinder;
//! use pdfgather::merge::{MergeOptions, Merger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("/course", r"L\d+", "lectures");
//! config.validate()?;
//!
//! let candidates = CandidateFinder::from_config(&config)?.find()?;
//! let merger = Merger::new(MergeOptions::from_config(&config));
//! let report = merger.run(&candidates, &config.output, false, |_| {}).await?;
//!
//! for warning in &report.warnings {
//!     eprintln!("skipped {warning}");
//! }
//! println!("{} pages written", report.pages_written);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use pdfgather::io::build_document;
//! use pdfgather::merge::{MergeAccumulator, PageExtractor};
//! use pdfgather::validation::DocumentValidator;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = DocumentValidator::new().validate(Path::new("input.pdf"))?;
//! let extraction = PageExtractor::new().extract(&handle)?;
//!
//! let mut acc = MergeAccumulator::new();
//! acc.append(extraction.pages);
//! let document = build_document(acc)?;
//! println!("{} pages", document.get_pages().len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod io;
pub mod merge;
pub mod output;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use error::{FailureKind, PdfGatherError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
