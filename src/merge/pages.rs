//! Page extraction.
//!
//! Turns the page tree of a validated document into self-contained
//! [`PageUnit`]s: the page dictionary with its inherited attributes merged
//! in, plus the identifiers of every object reachable from it. Page tree
//! nodes are never part of a closure; references to them are recorded as
//! links and resolved by the accumulator.
//!
//! Units only name the objects they need. The objects themselves stay in the
//! source document's shared table until the accumulator copies them, once per
//! append.

use std::collections::BTreeSet;
use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::{PdfGatherError, Result};
use crate::validation::{DocumentHandle, PageSlot, SourceId, SourceObjects};

/// A page and everything it needs to render, detached from its source tree.
#[derive(Debug, Clone)]
pub struct PageUnit {
    pub(crate) source: SourceId,
    pub(crate) number: u32,
    pub(crate) id: ObjectId,
    pub(crate) page: Dictionary,
    pub(crate) closure: BTreeSet<ObjectId>,
    pub(crate) links: BTreeSet<ObjectId>,
    pub(crate) objects: SourceObjects,
}

impl PageUnit {
    /// 1-based position of the page in its source document.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Document the page was extracted from.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Number of objects the page carries besides its own dictionary.
    pub fn object_count(&self) -> usize {
        self.closure.len()
    }
}

/// A page that could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFault {
    /// 1-based position of the page in its source document.
    pub number: u32,
    /// Why the page is unreadable.
    pub reason: String,
}

impl PageFault {
    /// Attach the source path to this fault.
    pub fn into_error(self, path: &Path) -> PdfGatherError {
        PdfGatherError::UnreadablePage {
            path: path.to_path_buf(),
            page: self.number,
            reason: self.reason,
        }
    }
}

/// Result of extracting every page of one document.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Readable pages, in source order.
    pub pages: Vec<PageUnit>,
    /// Unreadable pages, in source order.
    pub faults: Vec<PageFault>,
}

impl Extraction {
    /// Check if every page was readable.
    pub fn is_complete(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Extracts pages from validated documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageExtractor;

impl PageExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Lazily extract pages in source order.
    ///
    /// Each item is either a page or the fault that made it unreadable; a
    /// fault never stops the iteration.
    pub fn pages<'a>(
        self,
        handle: &'a DocumentHandle,
    ) -> impl Iterator<Item = std::result::Result<PageUnit, PageFault>> + 'a {
        handle
            .slots
            .iter()
            .zip(1u32..)
            .map(move |(slot, number)| -> std::result::Result<PageUnit, PageFault> {
                let (id, inherited) = match slot {
                    PageSlot::Page { id, inherited } => (*id, inherited),
                    PageSlot::Fault { reason } => {
                        return Err(PageFault {
                            number,
                            reason: reason.clone(),
                        });
                    }
                };

                let mut page = handle
                    .objects
                    .get(&id)
                    .and_then(|object| object.as_dict().ok())
                    .cloned()
                    .ok_or_else(|| PageFault {
                        number,
                        reason: format!("page object {} {} R is not a dictionary", id.0, id.1),
                    })?;
                page.remove(b"Parent");
                inherited.apply_to(&mut page);

                let (closure, links) = collect_closure(handle, id, &page)
                    .map_err(|reason| PageFault { number, reason })?;

                Ok(PageUnit {
                    source: handle.source,
                    number,
                    id,
                    page,
                    closure,
                    links,
                    objects: handle.objects.clone(),
                })
            })
    }

    /// Extract every page of a document.
    ///
    /// # Errors
    ///
    /// Returns [`PdfGatherError::MalformedPdf`] if the document has pages but
    /// none of them is readable.
    pub fn extract(&self, handle: &DocumentHandle) -> Result<Extraction> {
        let mut extraction = Extraction::default();

        for item in self.pages(handle) {
            match item {
                Ok(unit) => extraction.pages.push(unit),
                Err(fault) => {
                    warn!(
                        "Page {} of {} is unreadable: {}",
                        fault.number,
                        handle.path.display(),
                        fault.reason
                    );
                    extraction.faults.push(fault);
                }
            }
        }

        if extraction.pages.is_empty() && !extraction.faults.is_empty() {
            return Err(PdfGatherError::malformed_pdf(
                handle.path.clone(),
                format!("none of its {} page(s) is readable", extraction.faults.len()),
            ));
        }

        debug!(
            "Extracted {} page(s) from {}",
            extraction.pages.len(),
            handle.path.display()
        );

        Ok(extraction)
    }
}

/// Collect the identifiers of every object reachable from a page dictionary.
///
/// References to page tree nodes, including the page itself, end up in the
/// link set instead of the closure. A reference to an object the document
/// does not contain makes the page unreadable.
fn collect_closure(
    handle: &DocumentHandle,
    page_id: ObjectId,
    page: &Dictionary,
) -> std::result::Result<(BTreeSet<ObjectId>, BTreeSet<ObjectId>), String> {
    let mut closure = BTreeSet::new();
    let mut links = BTreeSet::new();
    let mut pending = Vec::new();
    collect_references(&Object::Dictionary(page.clone()), &mut pending);

    while let Some(id) = pending.pop() {
        if id == page_id || handle.tree_nodes.contains(&id) {
            links.insert(id);
            continue;
        }
        if closure.contains(&id) {
            continue;
        }

        let object = handle
            .objects
            .get(&id)
            .ok_or_else(|| format!("references missing object {} {} R", id.0, id.1))?;
        collect_references(object, &mut pending);
        closure.insert(id);
    }

    Ok((closure, links))
}

/// Push every indirect reference held by `object` onto `out`.
pub(crate) fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                collect_references(value, out);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                collect_references(value, out);
            }
        }
        _ => {}
    }
}
