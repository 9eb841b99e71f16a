//! Document builders shared by unit tests.

use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// Build a document with `pages` pages whose content reads `Page N`.
pub(crate) fn build_pdf(pages: u32) -> Document {
    build_labeled_pdf("Page", pages)
}

/// Build a document with `pages` pages whose content reads `{label} N`.
///
/// Resources live on the page tree root so pages have to inherit them.
pub(crate) fn build_labeled_pdf(label: &str, pages: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for number in 1..=pages {
        let text = format!("BT /F1 12 Tf 72 720 Td ({label} {number}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, text.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Identifier of the page tree root.
pub(crate) fn pages_root(doc: &Document) -> ObjectId {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .unwrap()
}

/// Point the content of page `number` (1-based) at an object that does not exist.
pub(crate) fn break_page_content(doc: &mut Document, number: u32) {
    let page_id = doc.get_pages()[&number];
    let missing = (doc.max_id + 100, 0);
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .unwrap()
        .set("Contents", missing);
}

/// Serialize a document to bytes.
pub(crate) fn pdf_bytes(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Decoded content text of every page, in page order.
pub(crate) fn page_texts(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}
