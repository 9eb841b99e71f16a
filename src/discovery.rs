//! Candidate discovery.
//!
//! Enumerates the PDF files of a directory whose file name matches a regular
//! expression and returns them in a deterministic order. The merge engine
//! never reorders what this module returns.

use std::path::{Path, PathBuf};

use fancy_regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{Config, OUTPUT_EXTENSION, SortOrder};
use crate::error::{PdfGatherError, Result};
use crate::utils::natural_cmp;

/// A file selected for possible inclusion in the merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Path to the file.
    pub path: PathBuf,
    /// Whether the file name matched the pattern.
    pub matched: bool,
}

impl Candidate {
    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Finds candidate PDFs in a directory.
#[derive(Debug, Clone)]
pub struct CandidateFinder {
    directory: PathBuf,
    pattern: Regex,
    recursive: bool,
    sort: SortOrder,
    exclude: Option<PathBuf>,
}

impl CandidateFinder {
    /// Create a finder for `directory` matching file names against `pattern`.
    pub fn new(directory: impl Into<PathBuf>, pattern: Regex) -> Self {
        Self {
            directory: directory.into(),
            pattern,
            recursive: false,
            sort: SortOrder::default(),
            exclude: None,
        }
    }

    /// Create a finder from configuration.
    ///
    /// The configured output file is excluded from the results.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(&config.directory, config.compile_pattern()?)
            .recursive(config.recursive)
            .sort(config.sort)
            .exclude(&config.output))
    }

    /// Descend into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the candidate ordering.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Never return `path`, even if it matches.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude = Some(path.into());
        self
    }

    /// Enumerate and sort the matching files.
    ///
    /// Only regular files with a `.pdf` extension (any case) are considered,
    /// and the pattern is searched for anywhere in the file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory itself cannot be read. Unreadable
    /// entries below it are skipped with a log message.
    pub fn find(&self) -> Result<Vec<Candidate>> {
        if !self.directory.is_dir() {
            return Err(PdfGatherError::invalid_config(format!(
                "Directory '{}' does not exist or is not a directory",
                self.directory.display()
            )));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(PdfGatherError::FileNotAccessible {
                        path: self.directory.clone(),
                        source: err.into(),
                    });
                }
                Err(err) => {
                    warn!("Skipping unreadable entry: {err}");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !has_pdf_extension(entry.path()) {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            match self.pattern.is_match(&name) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    warn!("Cannot match pattern against {name}: {err}");
                    continue;
                }
            }

            if self
                .exclude
                .as_deref()
                .is_some_and(|excluded| same_file(entry.path(), excluded))
            {
                debug!("Excluding output file {}", entry.path().display());
                continue;
            }

            candidates.push(Candidate {
                path: entry.into_path(),
                matched: true,
            });
        }

        self.sort_candidates(&mut candidates);
        debug!(
            "Found {} candidate(s) in {}",
            candidates.len(),
            self.directory.display()
        );

        Ok(candidates)
    }

    fn sort_candidates(&self, candidates: &mut [Candidate]) {
        match self.sort {
            SortOrder::Natural => candidates.sort_by(|a, b| {
                natural_cmp(&a.display_name(), &b.display_name()).then_with(|| a.path.cmp(&b.path))
            }),
            SortOrder::Lexicographic => candidates.sort_by(|a, b| a.path.cmp(&b.path)),
        }
    }
}

fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(OUTPUT_EXTENSION))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
