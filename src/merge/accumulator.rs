//! Merge accumulation.
//!
//! Collects pages from any number of source documents into one object space.
//! Every object entering the accumulator is given a fresh identifier, so
//! identifiers of different sources can never collide.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lopdf::{Object, ObjectId};
use tracing::{debug, warn};

use crate::error::PdfGatherError;
use crate::merge::pages::{PageUnit, collect_references};
use crate::validation::SourceId;

/// Lowest version written to the output header.
const BASE_VERSION: &str = "1.4";

/// A page the accumulator refused.
#[derive(Debug)]
pub struct RejectedPage {
    /// Document the page came from.
    pub source: SourceId,
    /// 1-based position of the page in its source document.
    pub number: u32,
    /// Why the page was refused.
    pub error: PdfGatherError,
}

/// Outcome of one [`MergeAccumulator::append`] call.
#[derive(Debug, Default)]
pub struct AppendOutcome {
    /// Number of pages added.
    pub appended: usize,
    /// Pages refused, in input order.
    pub rejected: Vec<RejectedPage>,
}

/// The output document under construction.
///
/// Identifiers `1 0`, `2 0` and `3 0` are reserved for the page tree root,
/// the catalog and the information dictionary; everything appended is
/// numbered from `4 0` upward.
#[derive(Debug)]
pub struct MergeAccumulator {
    pages_id: ObjectId,
    catalog_id: ObjectId,
    info_id: ObjectId,
    next_id: u32,
    objects: BTreeMap<ObjectId, Object>,
    kids: Vec<ObjectId>,
    version: String,
}

impl Default for MergeAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            pages_id: (1, 0),
            catalog_id: (2, 0),
            info_id: (3, 0),
            next_id: 4,
            objects: BTreeMap::new(),
            kids: Vec::new(),
            version: BASE_VERSION.to_string(),
        }
    }

    /// Append pages in the given order.
    ///
    /// Pages appended in one call share a translation table, so objects they
    /// have in common are stored once and references between them survive.
    /// References to page tree entries outside the call become null.
    ///
    /// A page referring to an object it does not carry is rejected before
    /// anything is allocated for it.
    pub fn append<I>(&mut self, pages: I) -> AppendOutcome
    where
        I: IntoIterator<Item = PageUnit>,
    {
        let mut outcome = AppendOutcome::default();

        let accepted: Vec<PageUnit> = pages
            .into_iter()
            .filter_map(|unit| match find_dangling(&unit) {
                None => Some(unit),
                Some(id) => {
                    warn!(
                        "Rejecting page {}: reference {} {} R is outside its closure",
                        unit.number, id.0, id.1
                    );
                    outcome.rejected.push(RejectedPage {
                        source: unit.source,
                        number: unit.number,
                        error: PdfGatherError::inconsistent_reference(id),
                    });
                    None
                }
            })
            .collect();

        let mut table: HashMap<(SourceId, ObjectId), ObjectId> = HashMap::new();
        for unit in &accepted {
            let page_id = self.allocate();
            table.insert((unit.source, unit.id), page_id);
        }
        for unit in &accepted {
            for &old in &unit.closure {
                if !table.contains_key(&(unit.source, old)) {
                    let new = self.allocate();
                    table.insert((unit.source, old), new);
                }
            }
        }

        let mut written: BTreeSet<ObjectId> = BTreeSet::new();
        for unit in accepted {
            let PageUnit {
                source,
                id,
                page,
                closure,
                objects,
                ..
            } = unit;

            for old in closure {
                let new = table[&(source, old)];
                if !written.insert(new) {
                    continue;
                }
                if let Some(object) = objects.get(&old) {
                    let mut object = object.clone();
                    remap(&mut object, source, &table);
                    self.objects.insert(new, object);
                }
            }

            let page_id = table[&(source, id)];
            let mut page = Object::Dictionary(page);
            remap(&mut page, source, &table);
            if let Object::Dictionary(dict) = &mut page {
                dict.set("Parent", self.pages_id);
            }
            self.objects.insert(page_id, page);
            self.kids.push(page_id);
            outcome.appended += 1;
        }

        debug!(
            "Appended {} page(s), {} rejected, {} object(s) total",
            outcome.appended,
            outcome.rejected.len(),
            self.objects.len()
        );

        outcome
    }

    /// Raise the output version to `version` if it is higher.
    pub fn note_version(&mut self, version: &str) {
        if parse_version(version) > parse_version(&self.version) {
            self.version = version.to_string();
        }
    }

    /// Version the output will declare.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Number of pages accumulated so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Check if no page has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.kids.is_empty()
    }

    /// Number of objects accumulated so far, page dictionaries included.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Output identifiers of the accumulated pages, in order.
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.kids
    }

    /// Reserved identifier of the page tree root.
    pub fn pages_id(&self) -> ObjectId {
        self.pages_id
    }

    /// Reserved identifier of the catalog.
    pub fn catalog_id(&self) -> ObjectId {
        self.catalog_id
    }

    /// Reserved identifier of the information dictionary.
    pub fn info_id(&self) -> ObjectId {
        self.info_id
    }

    /// Highest identifier in use.
    pub fn max_id(&self) -> u32 {
        self.next_id - 1
    }

    pub(crate) fn into_objects(self) -> BTreeMap<ObjectId, Object> {
        self.objects
    }

    fn allocate(&mut self) -> ObjectId {
        let id = (self.next_id, 0);
        self.next_id += 1;
        id
    }
}

/// First reference of a page that points outside what the page carries.
fn find_dangling(unit: &PageUnit) -> Option<ObjectId> {
    if let Some(&missing) = unit.closure.iter().find(|id| !unit.objects.contains_key(id)) {
        return Some(missing);
    }

    let mut references = Vec::new();
    collect_references(&Object::Dictionary(unit.page.clone()), &mut references);
    for id in &unit.closure {
        if let Some(object) = unit.objects.get(id) {
            collect_references(object, &mut references);
        }
    }

    references.into_iter().find(|id| {
        *id != unit.id && !unit.closure.contains(id) && !unit.links.contains(id)
    })
}

/// Rewrite every reference of `object` through the translation table.
///
/// References the table does not know point at page tree entries that were
/// not appended alongside this page and become null.
fn remap(object: &mut Object, source: SourceId, table: &HashMap<(SourceId, ObjectId), ObjectId>) {
    match object {
        Object::Reference(id) => {
            *object = match table.get(&(source, *id)) {
                Some(new) => Object::Reference(*new),
                None => Object::Null,
            };
        }
        Object::Array(items) => {
            for item in items {
                remap(item, source, table);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                remap(value, source, table);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                remap(value, source, table);
            }
        }
        _ => {}
    }
}

fn parse_version(version: &str) -> (u32, u32) {
    let mut parts = version.trim().split('.');
    let major = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor)
}
