//! Output assembly and writing.

pub mod writer;

pub use writer::{PdfWriter, WriteOptions, WriteStatistics, build_document, to_bytes};
