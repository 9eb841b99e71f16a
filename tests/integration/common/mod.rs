//! Shared helpers for the integration tests.
//!
//! Fixtures are generated with lopdf into a temporary directory, so no binary
//! files are checked in.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, Stream, dictionary};
use pdfgather::config::Config;
use pdfgather::discovery::CandidateFinder;
use pdfgather::merge::{MergeOptions, MergeReport, Merger};

/// Build a document whose page `N` shows the text `{label} N`.
pub fn labeled_pdf(label: &str, pages: u32) -> Document {
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
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
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
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Write a labelled document into `dir`.
pub fn write_pdf(dir: &Path, name: &str, label: &str, pages: u32) -> PathBuf {
    write_document(dir, name, &mut labeled_pdf(label, pages))
}

/// Write any document into `dir`.
pub fn write_document(dir: &Path, name: &str, doc: &mut Document) -> PathBuf {
    let path = dir.join(name);
    doc.save(&path).expect("Failed to write fixture");
    path
}

/// Write raw bytes into `dir`.
pub fn write_bytes(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}

/// Point the content of page `number` at an object that does not exist.
pub fn break_page_content(doc: &mut Document, number: u32) {
    let page_id = doc.get_pages()[&number];
    let missing = (doc.max_id + 100, 0);
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .expect("page exists")
        .set("Contents", missing);
}

/// Decoded content text of every page of a file, in page order.
pub fn page_texts(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Output is not a readable PDF");
    doc.get_pages()
        .values()
        .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
        .collect()
}

/// Configuration for `dir` with prompts disabled.
pub fn config(dir: &Path, pattern: &str, output: &str) -> Config {
    let mut config = Config::new(dir, pattern, output);
    config.overwrite_mode = pdfgather::config::OverwriteMode::Force;
    config.quiet = true;
    config
}

/// Discover candidates and run a merge the way the binary does.
pub async fn run(config: &Config) -> pdfgather::Result<MergeReport> {
    config.validate()?;
    let candidates = CandidateFinder::from_config(config)?.find()?;
    Merger::new(MergeOptions::from_config(config))
        .run(&candidates, &config.output, config.dry_run, |_| {})
        .await
}
