//! Merge orchestration.
//!
//! Drives validate → extract → append over an ordered candidate list. A
//! candidate that fails at any stage is recorded as a [`Warning`] and the run
//! moves on; only an empty result fails the run as a whole.
//!
//! Documents may be prepared ahead of the loop (`jobs > 1`), but pages are
//! always appended in candidate order.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::task;
use tracing::{debug, info, warn};

use crate::config::{CompressionLevel, Config, RecoveryPolicy};
use crate::discovery::Candidate;
use crate::error::{FailureKind, PdfGatherError, Result};
use crate::io::writer::{PdfWriter, build_document};
use crate::merge::accumulator::MergeAccumulator;
use crate::merge::pages::{Extraction, PageExtractor};
use crate::validation::DocumentValidator;

/// A problem with one candidate, or one page of it, that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Candidate the warning is about.
    pub path: PathBuf,
    /// Failure classification.
    pub kind: FailureKind,
    /// Human-readable reason.
    pub reason: String,
    /// 1-based page number, for page-level warnings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl Warning {
    /// Build a warning from an error.
    pub fn from_error(path: &Path, err: &PdfGatherError) -> Self {
        let page = match err {
            PdfGatherError::UnreadablePage { page, .. } => Some(*page),
            _ => None,
        };
        Self {
            path: path.to_path_buf(),
            kind: err.kind(),
            reason: err.reason(),
            page,
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// A candidate that contributed pages to the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedFile {
    /// Path of the candidate.
    pub path: PathBuf,
    /// Number of pages it contributed.
    pub pages: usize,
}

/// Progress notifications emitted while merging.
#[derive(Debug, Clone)]
pub enum MergeEvent {
    /// Processing of a candidate begins.
    ///
    /// Emitted before the candidate's validation result is awaited. With one
    /// job its validation has not started yet; with more it may already be
    /// under way.
    Processing {
        /// 0-based position in the candidate list.
        index: usize,
        /// Total number of candidates.
        total: usize,
        /// Candidate path.
        path: PathBuf,
    },
    /// A candidate's pages were appended.
    Merged(MergedFile),
    /// A candidate or page was skipped.
    Skipped(Warning),
}

/// Options controlling a merge.
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Handling of partially readable documents.
    pub recovery: RecoveryPolicy,
    /// Number of documents prepared ahead of the merge loop.
    pub jobs: usize,
    /// Output compression.
    pub compression: CompressionLevel,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            recovery: RecoveryPolicy::default(),
            jobs: 1,
            compression: CompressionLevel::default(),
        }
    }
}

impl MergeOptions {
    /// Merge options from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            recovery: config.recovery,
            jobs: config.jobs.max(1),
            compression: config.compression,
        }
    }
}

/// Pages accumulated from a candidate list, not yet written.
#[derive(Debug)]
pub struct MergedDocument {
    /// Accumulated output pages.
    pub accumulator: MergeAccumulator,
    /// Candidates that contributed pages, in order.
    pub merged_files: Vec<MergedFile>,
    /// Everything that was skipped.
    pub warnings: Vec<Warning>,
    /// Number of candidates attempted.
    pub candidates: usize,
    /// Time spent validating, extracting and appending.
    pub merge_time: Duration,
}

impl MergedDocument {
    /// Number of pages accumulated.
    pub fn page_count(&self) -> usize {
        self.accumulator.page_count()
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    /// Output path.
    pub output: PathBuf,
    /// Pages in the output, or that would be written in a dry run.
    pub pages_written: usize,
    /// Number of candidates attempted.
    pub candidates: usize,
    /// Candidates that contributed pages, in order.
    pub merged_files: Vec<MergedFile>,
    /// Everything that was skipped.
    pub warnings: Vec<Warning>,
    /// Whether a non-empty output was produced (or would be, in a dry run).
    pub success: bool,
    /// Whether the run was a dry run.
    pub dry_run: bool,
    /// Size of the written file in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u64>,
    /// Why the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Wall time of the whole run.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl MergeReport {
    /// Number of candidates that were skipped entirely.
    pub fn skipped_files(&self) -> usize {
        self.candidates - self.merged_files.len()
    }
}

/// A candidate after validation and extraction.
struct Prepared {
    version: String,
    extraction: Extraction,
}

/// PDF merger that combines candidate documents.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    options: MergeOptions,
    validator: DocumentValidator,
    extractor: PageExtractor,
}

impl Merger {
    /// Create a merger.
    pub fn new(options: MergeOptions) -> Self {
        Self {
            options,
            validator: DocumentValidator::new(),
            extractor: PageExtractor::new(),
        }
    }

    /// Merge options in effect.
    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Accumulate the pages of every usable candidate, in order.
    ///
    /// # Errors
    ///
    /// Only errors that are not specific to one candidate are returned.
    pub async fn merge(&self, candidates: &[Candidate]) -> Result<MergedDocument> {
        self.merge_with_progress(candidates, |_| {}).await
    }

    /// Like [`merge`](Self::merge), reporting progress through `on_event`.
    ///
    /// # Errors
    ///
    /// Only errors that are not specific to one candidate are returned.
    pub async fn merge_with_progress<F>(
        &self,
        candidates: &[Candidate],
        mut on_event: F,
    ) -> Result<MergedDocument>
    where
        F: FnMut(&MergeEvent),
    {
        let start = Instant::now();
        let total = candidates.len();
        let mut accumulator = MergeAccumulator::new();
        let mut merged_files = Vec::new();
        let mut warnings = Vec::new();

        let pending = stream::iter(candidates.iter().map(|c| c.path.clone()))
            .map(|path| {
                let validator = self.validator;
                let extractor = self.extractor;
                async move {
                    let blocking_path = path.clone();
                    let result = task::spawn_blocking(move || {
                        prepare(validator, extractor, &blocking_path)
                    })
                    .await
                    .map_err(|e| PdfGatherError::other(format!("Merge task failed: {e}")))
                    .and_then(|r| r);
                    (path, result)
                }
            })
            .buffered(self.options.jobs.max(1));
        let mut pending = std::pin::pin!(pending);

        for (index, candidate) in candidates.iter().enumerate() {
            on_event(&MergeEvent::Processing {
                index,
                total,
                path: candidate.path.clone(),
            });

            let Some((path, result)) = pending.next().await else {
                break;
            };

            let mut skip = |warning: Warning, warnings: &mut Vec<Warning>| {
                warn!("Skipping {}", warning);
                on_event(&MergeEvent::Skipped(warning.clone()));
                warnings.push(warning);
            };

            let prepared = match result {
                Ok(prepared) => prepared,
                Err(e) if e.is_recoverable() => {
                    skip(Warning::from_error(&path, &e), &mut warnings);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Prepared {
                version,
                extraction,
            } = prepared;

            if !extraction.is_complete() {
                let faults = extraction.faults.len();
                let page_total = faults + extraction.pages.len();
                if self.options.recovery == RecoveryPolicy::RejectDocument {
                    let warning = Warning {
                        path: path.clone(),
                        kind: FailureKind::Partial,
                        reason: format!(
                            "{faults} of {page_total} page(s) unreadable, document skipped"
                        ),
                        page: None,
                    };
                    skip(warning, &mut warnings);
                    continue;
                }
                for fault in extraction.faults {
                    let err = fault.into_error(&path);
                    skip(Warning::from_error(&path, &err), &mut warnings);
                }
            }

            if extraction.pages.is_empty() {
                let warning = Warning {
                    path: path.clone(),
                    kind: FailureKind::Format,
                    reason: "document has no pages".to_string(),
                    page: None,
                };
                skip(warning, &mut warnings);
                continue;
            }

            let outcome = accumulator.append(extraction.pages);
            for rejected in outcome.rejected {
                let mut warning = Warning::from_error(&path, &rejected.error);
                warning.page = Some(rejected.number);
                skip(warning, &mut warnings);
            }

            if outcome.appended > 0 {
                accumulator.note_version(&version);
                let merged = MergedFile {
                    path: path.clone(),
                    pages: outcome.appended,
                };
                info!("Merged {} page(s) from {}", merged.pages, path.display());
                on_event(&MergeEvent::Merged(merged.clone()));
                merged_files.push(merged);
            }
        }

        Ok(MergedDocument {
            accumulator,
            merged_files,
            warnings,
            candidates: total,
            merge_time: start.elapsed(),
        })
    }

    /// Merge the candidates and write the result to `output`.
    ///
    /// With `dry_run` nothing is written. A run with no candidates, or whose
    /// candidates yield no page, is reported as a failure without creating
    /// the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written, or on an error not
    /// specific to one candidate.
    pub async fn run<F>(
        &self,
        candidates: &[Candidate],
        output: &Path,
        dry_run: bool,
        on_event: F,
    ) -> Result<MergeReport>
    where
        F: FnMut(&MergeEvent),
    {
        let start = Instant::now();
        let mut report = MergeReport {
            output: output.to_path_buf(),
            pages_written: 0,
            candidates: candidates.len(),
            merged_files: Vec::new(),
            warnings: Vec::new(),
            success: false,
            dry_run,
            output_size: None,
            failure: None,
            elapsed: Duration::ZERO,
        };

        if candidates.is_empty() {
            let err = PdfGatherError::NoCandidates;
            report.warnings.push(Warning {
                path: output.to_path_buf(),
                kind: err.kind(),
                reason: "nothing matched the pattern; no output written".to_string(),
                page: None,
            });
            report.failure = Some(err.to_string());
            report.elapsed = start.elapsed();
            return Ok(report);
        }

        let merged = self.merge_with_progress(candidates, on_event).await?;
        debug!(
            "Accumulated {} page(s) from {} of {} candidate(s) in {:?}",
            merged.page_count(),
            merged.merged_files.len(),
            merged.candidates,
            merged.merge_time
        );

        report.pages_written = merged.page_count();
        report.merged_files = merged.merged_files;
        report.warnings = merged.warnings;

        if merged.accumulator.is_empty() {
            let err = PdfGatherError::EmptyResult {
                attempted: merged.candidates,
            };
            report.failure = Some(err.to_string());
            report.elapsed = start.elapsed();
            return Ok(report);
        }

        if !dry_run {
            let doc = build_document(merged.accumulator)?;
            let stats = PdfWriter::with_compression(self.options.compression)
                .save_with_stats(doc, output)
                .await?;
            report.output_size = Some(stats.file_size);
        }

        report.success = true;
        report.elapsed = start.elapsed();
        Ok(report)
    }
}

/// Validate and extract one candidate. Runs on a blocking thread.
fn prepare(
    validator: DocumentValidator,
    extractor: PageExtractor,
    path: &Path,
) -> Result<Prepared> {
    let handle = validator.validate(path)?;
    if handle.page_count() == 0 {
        debug!("{} has an empty page tree", path.display());
    }
    let extraction = extractor.extract(&handle)?;
    Ok(Prepared {
        version: handle.version().to_string(),
        extraction,
    })
}
