//! Error types for pdfgather.
//!
//! Errors fall into the categories of [`FailureKind`]. Per-candidate errors
//! (I/O on an input, format, unsupported) are recovered by the merger and
//! turned into [`Warning`](crate::merge::Warning)s; only configuration,
//! output and empty-result errors end a run.

use std::io;
use std::path::PathBuf;

use lopdf::ObjectId;
use serde::{Deserialize, Serialize};

/// Result type alias for pdfgather operations.
pub type Result<T> = std::result::Result<T, PdfGatherError>;

/// Broad classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Path missing, unreadable, or not a regular file.
    Io,
    /// Not a recognizable document, or a corrupt structure.
    Format,
    /// Some pages unreadable within an otherwise valid document.
    Partial,
    /// Protected or encrypted content.
    Unsupported,
    /// Nothing matched, or every candidate failed.
    EmptyResult,
    /// Internal inconsistency detected while merging.
    Internal,
    /// Invalid arguments or configuration.
    Config,
    /// Failure while producing the output file.
    Output,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Io => "i/o",
            Self::Format => "format",
            Self::Partial => "partial",
            Self::Unsupported => "unsupported",
            Self::EmptyResult => "empty-result",
            Self::Internal => "internal",
            Self::Config => "config",
            Self::Output => "output",
        };
        f.write_str(name)
    }
}

/// Main error type for pdfgather operations.
#[derive(Debug, thiserror::Error)]
pub enum PdfGatherError {
    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input path exists but is not a regular file.
    #[error("Not a file: {}", .path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    #[error("Cannot access file: {}\n  Reason: {source}", .path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// File does not carry a PDF signature.
    #[error("Not a PDF document: {}\n  Details: missing %PDF- header", .path.display())]
    NotAPdf {
        /// Path to the file.
        path: PathBuf,
    },

    /// PDF file is corrupted or has an invalid structure.
    #[error("Corrupted or invalid PDF: {}\n  Details: {details}", .path.display())]
    MalformedPdf {
        /// Path to the corrupted PDF.
        path: PathBuf,
        /// Details about the corruption.
        details: String,
    },

    /// PDF file is encrypted with a protection that cannot be removed.
    #[error(
        "PDF is encrypted and cannot be processed: {}\n  \
         Hint: Decrypt the PDF first using 'qpdf --decrypt' or similar tools",
        .path.display()
    )]
    EncryptedPdf {
        /// Path to the encrypted PDF.
        path: PathBuf,
    },

    /// A single page of an otherwise readable document is unreadable.
    #[error("Page {page} of {} is unreadable: {reason}", .path.display())]
    UnreadablePage {
        /// Path to the PDF file.
        path: PathBuf,
        /// 1-based page position in the source page tree.
        page: u32,
        /// Why the page could not be read.
        reason: String,
    },

    /// A page refers to an object outside the objects it carries.
    #[error("Reference {object} {generation} R points outside the page's object closure")]
    InconsistentReference {
        /// Object number of the offending source reference.
        object: u32,
        /// Generation number of the offending source reference.
        generation: u16,
    },

    /// The search produced no candidate files.
    #[error("No PDF files matched the pattern")]
    NoCandidates,

    /// Candidates were found but none contributed a page.
    #[error("No pages could be merged from {attempted} candidate file(s)")]
    EmptyResult {
        /// Number of candidates that were attempted.
        attempted: usize,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output path",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", .path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The filename pattern is not a valid regular expression.
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as given.
        pattern: String,
        /// Compilation error.
        source: fancy_regex::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Error reported by the PDF library outside of input validation.
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl PdfGatherError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create a NotAPdf error.
    pub fn not_a_pdf(path: PathBuf) -> Self {
        Self::NotAPdf { path }
    }

    /// Create a MalformedPdf error.
    pub fn malformed_pdf(path: PathBuf, details: impl Into<String>) -> Self {
        Self::MalformedPdf {
            path,
            details: details.into(),
        }
    }

    /// Create an EncryptedPdf error.
    pub fn encrypted_pdf(path: PathBuf) -> Self {
        Self::EncryptedPdf { path }
    }

    /// Create an InconsistentReference error for a source identifier.
    pub fn inconsistent_reference(id: ObjectId) -> Self {
        Self::InconsistentReference {
            object: id.0,
            generation: id.1,
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::FileNotFound { .. }
            | Self::NotAFile { .. }
            | Self::FileNotAccessible { .. }
            | Self::Io(_) => FailureKind::Io,
            Self::NotAPdf { .. } | Self::MalformedPdf { .. } | Self::Pdf(_) => FailureKind::Format,
            Self::EncryptedPdf { .. } => FailureKind::Unsupported,
            Self::UnreadablePage { .. } => FailureKind::Partial,
            Self::InconsistentReference { .. } | Self::Other { .. } => FailureKind::Internal,
            Self::NoCandidates | Self::EmptyResult { .. } => FailureKind::EmptyResult,
            Self::InvalidPattern { .. } | Self::InvalidConfig { .. } | Self::Cancelled => {
                FailureKind::Config
            }
            Self::OutputExists { .. }
            | Self::FailedToCreateOutput { .. }
            | Self::FailedToWrite { .. } => FailureKind::Output,
        }
    }

    /// Short, path-free description used in warnings.
    pub fn reason(&self) -> String {
        match self {
            Self::FileNotFound { .. } => "file not found".to_string(),
            Self::NotAFile { .. } => "not a regular file".to_string(),
            Self::FileNotAccessible { source, .. } => format!("cannot read file: {source}"),
            Self::NotAPdf { .. } => "not a PDF document (missing %PDF- header)".to_string(),
            Self::MalformedPdf { details, .. } => format!("malformed PDF: {details}"),
            Self::EncryptedPdf { .. } => "encrypted PDF is not supported".to_string(),
            Self::UnreadablePage { page, reason, .. } => format!("page {page} skipped: {reason}"),
            other => other.to_string(),
        }
    }

    /// Check if this error only affects a single candidate.
    ///
    /// Recoverable errors are downgraded to warnings by the merger.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::NotAFile { .. }
                | Self::FileNotAccessible { .. }
                | Self::NotAPdf { .. }
                | Self::MalformedPdf { .. }
                | Self::EncryptedPdf { .. }
                | Self::UnreadablePage { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } | Self::NotAFile { .. } | Self::FileNotAccessible { .. } => 2,
            Self::NotAPdf { .. }
            | Self::MalformedPdf { .. }
            | Self::EncryptedPdf { .. }
            | Self::UnreadablePage { .. }
            | Self::Pdf(_) => 3,
            Self::NoCandidates | Self::EmptyResult { .. } => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } | Self::FailedToWrite { .. } | Self::Io(_) => 5,
            Self::InconsistentReference { .. } => 6,
            Self::InvalidPattern { .. } | Self::InvalidConfig { .. } | Self::Other { .. } => 1,
            Self::Cancelled => 130, // Standard exit code for SIGINT
        }
    }
}
