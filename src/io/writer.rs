//! Output document assembly and writing.
//!
//! This module turns a [`MergeAccumulator`] into a complete document and
//! writes it with:
//! - Atomic writes (write to a sibling temp file, then rename)
//! - Compression support
//! - Write statistics
//!
//! # Examples
//!
//! ```no_run
//! use pdfgather::io::writer::{PdfWriter, build_document};
//! use pdfgather::merge::MergeAccumulator;
//! use std::path::Path;
//!
//! # async fn example(acc: MergeAccumulator) -> Result<(), Box<dyn std::error::Error>> {
//! let doc = build_document(acc)?;
//! PdfWriter::new().save(doc, Path::new("output.pdf")).await?;
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use lopdf::{Document, Object, dictionary};
use tokio::task;
use tracing::debug;

use crate::config::CompressionLevel;
use crate::error::{PdfGatherError, Result};
use crate::merge::MergeAccumulator;
use crate::utils::format_file_size;

/// Value of the `Producer` entry of every output document.
pub const PRODUCER: &str = concat!("pdfgather ", env!("CARGO_PKG_VERSION"));

/// Buffer size for writing (in bytes).
const BUFFER_SIZE: usize = 8192;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Compress the PDF before writing.
    pub compress: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { compress: true }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Whether compression was applied.
    pub compressed: bool,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Assemble the accumulated pages into a complete document.
///
/// The page tree is flat: one root whose kids are the accumulated pages in
/// order. The document declares the highest version among its sources.
///
/// # Errors
///
/// Returns [`PdfGatherError::EmptyResult`] if no page was accumulated.
pub fn build_document(acc: MergeAccumulator) -> Result<Document> {
    if acc.is_empty() {
        return Err(PdfGatherError::EmptyResult { attempted: 0 });
    }

    let mut doc = Document::with_version(acc.version());
    let pages_id = acc.pages_id();
    let catalog_id = acc.catalog_id();
    let info_id = acc.info_id();
    let max_id = acc.max_id();
    let kids: Vec<Object> = acc.page_ids().iter().map(|&id| Object::Reference(id)).collect();
    let count = kids.len() as i64;

    doc.objects = acc.into_objects();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    doc.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );
    doc.objects.insert(
        info_id,
        Object::Dictionary(dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
        }),
    );
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.max_id = max_id;

    debug!(
        "Built document: PDF {}, {} page(s), {} object(s)",
        doc.version,
        count,
        doc.objects.len()
    );

    Ok(doc)
}

/// Serialize a document to memory.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfGatherError::Io(std::io::Error::other(e)))?;
    Ok(bytes)
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer for a compression level.
    pub fn with_compression(level: CompressionLevel) -> Self {
        Self {
            options: WriteOptions {
                compress: level != CompressionLevel::None,
            },
        }
    }

    /// Save a PDF document to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be created or written.
    pub async fn save(&self, doc: Document, path: &Path) -> Result<()> {
        let _stats = self.save_with_stats(doc, path).await?;
        Ok(())
    }

    /// Save a PDF and return statistics about the operation.
    ///
    /// Missing parent directories are created. The document is written to a
    /// sibling temp file and renamed into place, so nothing is left at `path`
    /// if writing fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The parent directory cannot be created
    /// - Insufficient permissions
    /// - Disk full
    /// - Write operation fails
    pub async fn save_with_stats(&self, mut doc: Document, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        let stats = task::spawn_blocking(move || {
            let start = Instant::now();

            if let Some(parent) = path_buf.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PdfGatherError::FailedToCreateOutput {
                        path: path_buf.clone(),
                        source: e,
                    }
                })?;
            }

            if options.compress {
                doc.compress();
            }

            let write_path = temp_path(&path_buf);
            if let Err(e) = write_document(&mut doc, &write_path) {
                let _ = std::fs::remove_file(&write_path);
                return Err(e);
            }

            std::fs::rename(&write_path, &path_buf).map_err(|e| {
                let _ = std::fs::remove_file(&write_path);
                PdfGatherError::FailedToWrite {
                    path: path_buf.clone(),
                    source: e,
                }
            })?;

            let write_time = start.elapsed();
            let file_size = std::fs::metadata(&path_buf).map(|m| m.len()).unwrap_or(0);

            Ok::<_, PdfGatherError>(WriteStatistics {
                write_time,
                file_size,
                output_path: path_buf,
                compressed: options.compress,
            })
        })
        .await
        .map_err(|e| PdfGatherError::other(format!("Write task failed: {e}")))??;

        debug!(
            "Wrote {} ({}) in {:?}",
            stats.output_path.display(),
            stats.format_file_size(),
            stats.write_time
        );

        Ok(stats)
    }

    /// Check if output file exists.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

fn write_document(doc: &mut Document, path: &Path) -> Result<()> {
    let file =
        std::fs::File::create(path).map_err(|e| PdfGatherError::FailedToCreateOutput {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut writer = std::io::BufWriter::with_capacity(BUFFER_SIZE, file);

    doc.save_to(&mut writer)
        .map_err(|e| PdfGatherError::FailedToWrite {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    writer.flush().map_err(|e| PdfGatherError::FailedToWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Sibling temp file used for atomic writes, e.g. `all.pdf.part`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
