//! PDF merging.
//!
//! - [`pages`]: extraction of self-contained pages from a validated document
//! - [`accumulator`]: the output object space and identifier renumbering
//! - [`merger`]: orchestration over a candidate list

pub mod accumulator;
pub mod merger;
pub mod pages;

pub use accumulator::{AppendOutcome, MergeAccumulator, RejectedPage};
pub use merger::{
    MergeEvent, MergeOptions, MergeReport, MergedDocument, MergedFile, Merger, Warning,
};
pub use pages::{Extraction, PageExtractor, PageFault, PageUnit};
