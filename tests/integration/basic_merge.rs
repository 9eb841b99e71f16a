//! Integration tests for pattern-driven merging.

use std::collections::BTreeSet;

use anyhow::Result;
use lopdf::{Document, Object, dictionary};
use tempfile::TempDir;

use pdfgather::config::SortOrder;
use pdfgather::merge::{MergeAccumulator, PageExtractor};
use pdfgather::validation::DocumentValidator;

use crate::common::{config, labeled_pdf, page_texts, run, write_document, write_pdf};

#[tokio::test]
async fn test_merge_concatenates_in_natural_order() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "L10.pdf", "ten", 1);
    write_pdf(dir.path(), "L2.pdf", "two", 2);
    write_pdf(dir.path(), "L1.pdf", "one", 1);
    write_pdf(dir.path(), "notes.pdf", "notes", 1);

    let report = run(&config(dir.path(), r"^L\d+", "lectures")).await?;

    assert!(report.success);
    assert_eq!(report.pages_written, 4);
    assert_eq!(report.candidates, 3);
    assert!(report.warnings.is_empty());

    let texts = page_texts(&dir.path().join("lectures.pdf"));
    let expected = ["one 1", "two 1", "two 2", "ten 1"];
    assert_eq!(texts.len(), expected.len());
    for (text, label) in texts.iter().zip(expected) {
        assert!(text.contains(label), "{text:?} should contain {label:?}");
    }
    Ok(())
}

#[tokio::test]
async fn test_lexicographic_order() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "L10.pdf", "ten", 1);
    write_pdf(dir.path(), "L2.pdf", "two", 1);

    let mut cfg = config(dir.path(), "^L", "out");
    cfg.sort = SortOrder::Lexicographic;
    run(&cfg).await?;

    let texts = page_texts(&dir.path().join("out.pdf"));
    assert!(texts[0].contains("ten 1"));
    assert!(texts[1].contains("two 1"));
    Ok(())
}

#[tokio::test]
async fn test_output_has_sum_of_pages() -> Result<()> {
    let dir = TempDir::new()?;
    for (i, pages) in [3u32, 1, 4, 2].into_iter().enumerate() {
        write_pdf(dir.path(), &format!("part{i}.pdf"), &format!("P{i}"), pages);
    }

    let report = run(&config(dir.path(), "part", "all.pdf")).await?;

    assert_eq!(report.pages_written, 10);
    let merged: usize = report.merged_files.iter().map(|f| f.pages).sum();
    assert_eq!(merged, 10);

    let doc = Document::load(dir.path().join("all.pdf"))?;
    assert_eq!(doc.get_pages().len(), 10);
    Ok(())
}

#[tokio::test]
async fn test_output_is_excluded_from_candidates() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "a.pdf", "A", 1);
    write_pdf(dir.path(), "b.pdf", "B", 1);
    // A previous run's output matches the pattern too.
    write_pdf(dir.path(), "merged.pdf", "OLD", 5);

    let report = run(&config(dir.path(), r"\.pdf$", "merged")).await?;

    assert_eq!(report.candidates, 2);
    assert_eq!(report.pages_written, 2);
    Ok(())
}

#[tokio::test]
async fn test_merging_twice_is_identical() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "x1.pdf", "X", 2);
    write_pdf(dir.path(), "x2.pdf", "Y", 3);

    let mut cfg = config(dir.path(), "^x", "first");
    cfg.compression = pdfgather::config::CompressionLevel::None;
    run(&cfg).await?;
    cfg.output = dir.path().join("second.pdf");
    run(&cfg).await?;

    assert_eq!(
        page_texts(&dir.path().join("first.pdf")),
        page_texts(&dir.path().join("second.pdf"))
    );
    Ok(())
}

#[tokio::test]
async fn test_output_has_no_dangling_references() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "a.pdf", "A", 3);
    write_pdf(dir.path(), "b.pdf", "B", 3);

    let mut cfg = config(dir.path(), r"\.pdf$", "out");
    cfg.compression = pdfgather::config::CompressionLevel::None;
    run(&cfg).await?;

    let doc = Document::load(dir.path().join("out.pdf"))?;
    let mut pending: Vec<&Object> = doc.objects.values().collect();
    while let Some(object) = pending.pop() {
        match object {
            Object::Reference(id) => assert!(doc.objects.contains_key(id), "dangling {id:?}"),
            Object::Array(items) => pending.extend(items.iter()),
            Object::Dictionary(dict) => pending.extend(dict.iter().map(|(_, v)| v)),
            Object::Stream(stream) => pending.extend(stream.dict.iter().map(|(_, v)| v)),
            _ => {}
        }
    }
    Ok(())
}

#[test]
fn test_identifier_spaces_are_disjoint() -> Result<()> {
    // Two sources with identical object numbering.
    let mut acc = MergeAccumulator::new();
    let mut seen = BTreeSet::new();

    for label in ["A", "B"] {
        let mut doc = labeled_pdf(label, 2);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;

        let handle = DocumentValidator::new().validate_bytes("mem.pdf".as_ref(), &bytes)?;
        let before = acc.max_id();
        acc.append(PageExtractor::new().extract(&handle)?.pages);

        let ids: BTreeSet<u32> = (before + 1..=acc.max_id()).collect();
        assert!(seen.is_disjoint(&ids));
        seen.extend(ids);
    }

    assert_eq!(acc.page_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_nested_page_tree_order() -> Result<()> {
    let dir = TempDir::new()?;

    // Split a flat tree into two intermediate nodes.
    let mut doc = labeled_pdf("N", 4);
    let catalog_pages = doc
        .catalog()?
        .get(b"Pages")?
        .as_reference()?;
    let kids = doc
        .get_object(catalog_pages)?
        .as_dict()?
        .get(b"Kids")?
        .as_array()?
        .clone();

    let mut nodes = Vec::new();
    for chunk in kids.chunks(2) {
        let node_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Parent" => catalog_pages,
            "Kids" => chunk.to_vec(),
            "Count" => chunk.len() as i64,
        });
        for kid in chunk {
            doc.get_object_mut(kid.as_reference()?)?
                .as_dict_mut()?
                .set("Parent", node_id);
        }
        nodes.push(Object::Reference(node_id));
    }
    doc.get_object_mut(catalog_pages)?
        .as_dict_mut()?
        .set("Kids", nodes);
    write_document(dir.path(), "nested.pdf", &mut doc);

    let report = run(&config(dir.path(), "nested", "out")).await?;
    assert_eq!(report.pages_written, 4);

    let texts = page_texts(&dir.path().join("out.pdf"));
    for (i, text) in texts.iter().enumerate() {
        assert!(text.contains(&format!("N {}", i + 1)));
    }
    Ok(())
}
