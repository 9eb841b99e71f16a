//! Integration tests for damaged, missing and unsupported inputs.

use anyhow::Result;
use lopdf::dictionary;
use tempfile::TempDir;

use pdfgather::FailureKind;
use pdfgather::config::RecoveryPolicy;
use pdfgather::error::PdfGatherError;

use crate::common::{
    break_page_content, config, labeled_pdf, page_texts, run, write_bytes, write_document,
    write_pdf,
};

#[tokio::test]
async fn test_no_candidates_fails_without_output() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "a.pdf", "A", 1);

    let report = run(&config(dir.path(), "^zzz", "out")).await?;

    assert!(!report.success);
    assert_eq!(report.candidates, 0);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, FailureKind::EmptyResult);
    assert!(!dir.path().join("out.pdf").exists());
    Ok(())
}

#[tokio::test]
async fn test_one_malformed_among_many() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "doc1.pdf", "first", 2);
    write_pdf(dir.path(), "doc2.pdf", "second", 1);
    let mut truncated = Vec::new();
    labeled_pdf("bad", 3).save_to(&mut truncated)?;
    truncated.truncate(40);
    write_bytes(dir.path(), "doc3.pdf", &truncated);
    write_pdf(dir.path(), "doc4.pdf", "fourth", 1);

    let report = run(&config(dir.path(), "^doc", "out")).await?;

    assert!(report.success);
    assert_eq!(report.pages_written, 4);
    assert_eq!(report.merged_files.len(), 3);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].path.ends_with("doc3.pdf"));

    let texts = page_texts(&dir.path().join("out.pdf"));
    assert!(texts[0].contains("first 1"));
    assert!(texts[2].contains("second 1"));
    assert!(texts[3].contains("fourth 1"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_page_is_salvaged() -> Result<()> {
    let dir = TempDir::new()?;
    let mut doc = labeled_pdf("P", 5);
    break_page_content(&mut doc, 3);
    write_document(dir.path(), "five.pdf", &mut doc);

    let report = run(&config(dir.path(), "five", "out")).await?;

    assert!(report.success);
    assert_eq!(report.pages_written, 4);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, FailureKind::Partial);
    assert_eq!(report.warnings[0].page, Some(3));

    let texts = page_texts(&dir.path().join("out.pdf"));
    let expected = ["P 1", "P 2", "P 4", "P 5"];
    for (text, label) in texts.iter().zip(expected) {
        assert!(text.contains(label), "{text:?} should contain {label:?}");
    }
    Ok(())
}

#[tokio::test]
async fn test_corrupt_page_rejects_document_when_asked() -> Result<()> {
    let dir = TempDir::new()?;
    let mut doc = labeled_pdf("P", 5);
    break_page_content(&mut doc, 3);
    write_document(dir.path(), "a-five.pdf", &mut doc);
    write_pdf(dir.path(), "b-ok.pdf", "OK", 1);

    let mut cfg = config(dir.path(), r"\.pdf$", "out");
    cfg.recovery = RecoveryPolicy::RejectDocument;
    let report = run(&cfg).await?;

    assert!(report.success);
    assert_eq!(report.pages_written, 1);
    assert_eq!(report.skipped_files(), 1);
    Ok(())
}

#[tokio::test]
async fn test_all_candidates_fail() -> Result<()> {
    let dir = TempDir::new()?;
    write_bytes(dir.path(), "a.pdf", b"");
    write_bytes(dir.path(), "b.pdf", b"<html>not a pdf</html>");

    let report = run(&config(dir.path(), r"\.pdf$", "out")).await?;

    assert!(!report.success);
    assert_eq!(report.pages_written, 0);
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings.iter().all(|w| w.kind == FailureKind::Format));
    assert!(!dir.path().join("out.pdf").exists());
    Ok(())
}

#[tokio::test]
async fn test_encrypted_candidate_is_unsupported() -> Result<()> {
    let dir = TempDir::new()?;
    let mut doc = labeled_pdf("secret", 1);
    let encrypt_id = doc.add_object(dictionary! { "Filter" => "Standard", "V" => 1 });
    doc.trailer.set("Encrypt", encrypt_id);
    write_document(dir.path(), "a-secret.pdf", &mut doc);
    write_pdf(dir.path(), "b-open.pdf", "open", 1);

    let report = run(&config(dir.path(), r"\.pdf$", "out")).await?;

    assert!(report.success);
    assert_eq!(report.pages_written, 1);
    assert_eq!(report.warnings[0].kind, FailureKind::Unsupported);
    Ok(())
}

#[tokio::test]
async fn test_invalid_pattern_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let err = run(&config(dir.path(), "L(", "out")).await.unwrap_err();

    assert!(matches!(err, PdfGatherError::InvalidPattern { .. }));
    assert_eq!(err.kind(), FailureKind::Config);
}

#[tokio::test]
async fn test_missing_directory() {
    let err = run(&config("/nonexistent/dir".as_ref(), ".*", "out"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Config);
}
