//! Document validation.
//!
//! Opens a candidate file, checks that it is a readable PDF and maps out its
//! page tree without materializing page content. Failures are classified so
//! the merger can report why a candidate was skipped:
//! - I/O: missing, unreadable, or not a regular file
//! - Format: no `%PDF-` signature, or a structure the parser rejects
//! - Unsupported: encryption that cannot be removed
//!
//! # Examples
//!
//! ```no_run
//! use pdfgather::validation::DocumentValidator;
//! use std::path::Path;
//!
//! let validator = DocumentValidator::new();
//! let handle = validator.validate(Path::new("lecture.pdf"))?;
//! println!("{} pages", handle.page_count());
//! # Ok::<(), pdfgather::PdfGatherError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::debug;

use crate::error::{PdfGatherError, Result};

/// Bytes searched for the `%PDF-` signature.
const HEADER_WINDOW: usize = 1024;

/// Page attributes a page inherits from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

static NEXT_SOURCE: AtomicU64 = AtomicU64::new(1);

/// Identity of one opened source document.
///
/// Object identifiers are only unique within a document; pairing them with a
/// `SourceId` keeps identifiers of different documents apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(u64);

impl SourceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SOURCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Inheritable attributes collected while descending the page tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct Inherited {
    values: Vec<(&'static [u8], Object)>,
}

impl Inherited {
    /// Attributes in effect below `node`.
    fn below(&self, node: &Dictionary) -> Self {
        let mut next = self.clone();
        for key in INHERITABLE_KEYS {
            if let Ok(value) = node.get(key) {
                next.values.retain(|(k, _)| *k != key);
                next.values.push((key, value.clone()));
            }
        }
        next
    }

    /// Copy inherited attributes the page does not define itself.
    pub(crate) fn apply_to(&self, page: &mut Dictionary) {
        for (key, value) in &self.values {
            if !page.has(key) {
                page.set(key.to_vec(), value.clone());
            }
        }
    }
}

/// One leaf position of a document's page tree.
#[derive(Debug, Clone)]
pub(crate) enum PageSlot {
    /// A page object that could be resolved.
    Page {
        /// Source identifier of the page object.
        id: ObjectId,
        /// Attributes inherited from ancestor nodes.
        inherited: Inherited,
    },
    /// A page tree entry that could not be resolved.
    Fault {
        /// Why the entry is unreadable.
        reason: String,
    },
}

/// Object table of a parsed source document.
///
/// Shared between a handle and the pages extracted from it, so objects used
/// by many pages are held once until they are copied into the output.
pub(crate) type SourceObjects = Arc<BTreeMap<ObjectId, Object>>;

/// An opened, parsed source document.
///
/// Owned by the merger for the duration of one candidate and dropped once
/// that candidate's pages have been accumulated.
#[derive(Debug)]
pub struct DocumentHandle {
    pub(crate) source: SourceId,
    pub(crate) path: PathBuf,
    pub(crate) version: String,
    pub(crate) objects: SourceObjects,
    pub(crate) slots: Vec<PageSlot>,
    pub(crate) tree_nodes: BTreeSet<ObjectId>,
    file_size: u64,
}

impl DocumentHandle {
    /// Path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identity of this document.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Number of leaf positions in the page tree, readable or not.
    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of page tree entries that could not be resolved.
    pub fn faulty_page_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, PageSlot::Fault { .. }))
            .count()
    }

    /// PDF version from the file header.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Size of the source file in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of objects in the document.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

/// Validator for candidate PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentValidator;

impl DocumentValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Open and validate a file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path does not exist, is not a file, or cannot be read
    /// - The file does not start with a PDF signature
    /// - The parser rejects the file or its page tree root is unreadable
    /// - The file is encrypted
    pub fn validate(&self, path: &Path) -> Result<DocumentHandle> {
        let bytes = read_candidate(path)?;
        self.validate_bytes(path, &bytes)
    }

    /// Validate a document already read into memory.
    ///
    /// `path` is only used to label the handle and any error.
    pub fn validate_bytes(&self, path: &Path, bytes: &[u8]) -> Result<DocumentHandle> {
        let path_buf = path.to_path_buf();

        if bytes.is_empty() {
            return Err(PdfGatherError::malformed_pdf(path_buf, "File is empty"));
        }

        if !has_pdf_signature(bytes) {
            return Err(PdfGatherError::not_a_pdf(path_buf));
        }

        let mut document = Document::load_mem(bytes).map_err(|err| {
            let message = err.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("encrypt")
                || lowered.contains("password")
                || lowered.contains("decrypt")
                || contains(bytes, b"/Encrypt")
            {
                PdfGatherError::encrypted_pdf(path_buf.clone())
            } else {
                PdfGatherError::malformed_pdf(path_buf.clone(), message)
            }
        })?;

        if document.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfGatherError::encrypted_pdf(path_buf));
        }

        let (slots, tree_nodes) = map_page_tree(&document)
            .map_err(|details| PdfGatherError::malformed_pdf(path_buf.clone(), details))?;

        debug!(
            "Validated {}: PDF {}, {} page(s), {} object(s)",
            path.display(),
            document.version,
            slots.len(),
            document.objects.len()
        );

        Ok(DocumentHandle {
            source: SourceId::next(),
            path: path_buf,
            version: std::mem::take(&mut document.version),
            objects: Arc::new(std::mem::take(&mut document.objects)),
            slots,
            tree_nodes,
            file_size: bytes.len() as u64,
        })
    }
}

/// Read a candidate file, classifying I/O failures.
pub(crate) fn read_candidate(path: &Path) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path).map_err(|err| io_error(path, err))?;
    if !metadata.is_file() {
        return Err(PdfGatherError::not_a_file(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|err| io_error(path, err))
}

pub(crate) fn io_error(path: &Path, err: std::io::Error) -> PdfGatherError {
    if err.kind() == ErrorKind::NotFound {
        PdfGatherError::file_not_found(path.to_path_buf())
    } else {
        PdfGatherError::FileNotAccessible {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

fn has_pdf_signature(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    contains(window, b"%PDF-")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Map the page tree into leaf slots, depth-first, left to right.
///
/// Unreadable entries below the root become [`PageSlot::Fault`]s; an
/// unreadable root is an error.
fn map_page_tree(
    doc: &Document,
) -> std::result::Result<(Vec<PageSlot>, BTreeSet<ObjectId>), String> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| "Trailer has no document catalog".to_string())?;
    let catalog = doc
        .get_object(root_id)
        .and_then(Object::as_dict)
        .map_err(|e| format!("Document catalog is unreadable: {e}"))?;
    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| "Document catalog has no page tree".to_string())?;
    let pages = doc
        .get_object(pages_id)
        .and_then(Object::as_dict)
        .map_err(|e| format!("Page tree root is unreadable: {e}"))?;
    if pages.get(b"Kids").and_then(Object::as_array).is_err() {
        return Err("Page tree root has no Kids array".to_string());
    }

    let mut slots = Vec::new();
    let mut nodes = BTreeSet::from([pages_id]);

    // Each frame holds the remaining kids of one node, reversed so that
    // popping yields them left to right.
    let mut stack: Vec<(Vec<Object>, Inherited)> =
        vec![(reversed_kids(pages), Inherited::default().below(pages))];

    while let Some((kids, inherited)) = stack.last_mut() {
        let Some(kid) = kids.pop() else {
            stack.pop();
            continue;
        };
        let inherited = inherited.clone();

        let kid_id = match kid.as_reference() {
            Ok(id) => id,
            Err(_) => {
                slots.push(PageSlot::Fault {
                    reason: "Page tree entry is not a reference".to_string(),
                });
                continue;
            }
        };

        if !nodes.insert(kid_id) {
            slots.push(PageSlot::Fault {
                reason: format!("Page tree revisits object {} {} R", kid_id.0, kid_id.1),
            });
            continue;
        }

        let node = match doc.get_object(kid_id).and_then(Object::as_dict) {
            Ok(node) => node,
            Err(e) => {
                slots.push(PageSlot::Fault {
                    reason: format!("Page object {} {} R is unreadable: {e}", kid_id.0, kid_id.1),
                });
                continue;
            }
        };

        if is_intermediate(node) {
            match node.get(b"Kids").and_then(Object::as_array) {
                Ok(_) => stack.push((reversed_kids(node), inherited.below(node))),
                Err(_) => slots.push(PageSlot::Fault {
                    reason: format!("Page tree node {} {} R has no Kids array", kid_id.0, kid_id.1),
                }),
            }
        } else {
            slots.push(PageSlot::Page {
                id: kid_id,
                inherited,
            });
        }
    }

    Ok((slots, nodes))
}

fn is_intermediate(node: &Dictionary) -> bool {
    match node.get(b"Type").and_then(Object::as_name) {
        Ok(name) => name == b"Pages",
        Err(_) => node.has(b"Kids"),
    }
}

fn reversed_kids(node: &Dictionary) -> Vec<Object> {
    let mut kids = node
        .get(b"Kids")
        .and_then(Object::as_array)
        .cloned()
        .unwrap_or_default();
    kids.reverse();
    kids
}
