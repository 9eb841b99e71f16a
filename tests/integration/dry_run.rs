//! Integration tests for dry-run mode.

use anyhow::Result;
use tempfile::TempDir;

use crate::common::{config, run, write_bytes, write_pdf};

#[tokio::test]
async fn test_dry_run_creates_no_output() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "L1.pdf", "one", 2);
    write_pdf(dir.path(), "L2.pdf", "two", 3);

    let mut cfg = config(dir.path(), "^L", "out");
    cfg.dry_run = true;
    let report = run(&cfg).await?;

    assert!(report.success);
    assert!(report.dry_run);
    assert_eq!(report.pages_written, 5);
    assert_eq!(report.merged_files.len(), 2);
    assert!(report.output_size.is_none());
    assert!(!dir.path().join("out.pdf").exists());
    Ok(())
}

#[tokio::test]
async fn test_dry_run_reports_warnings() -> Result<()> {
    let dir = TempDir::new()?;
    write_pdf(dir.path(), "L1.pdf", "one", 1);
    write_bytes(dir.path(), "L2.pdf", b"definitely not a pdf");

    let mut cfg = config(dir.path(), "^L", "out");
    cfg.dry_run = true;
    let report = run(&cfg).await?;

    assert!(report.success);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].path.ends_with("L2.pdf"));
    assert!(!dir.path().join("out.pdf").exists());
    Ok(())
}

#[tokio::test]
async fn test_dry_run_with_nothing_to_merge() -> Result<()> {
    let dir = TempDir::new()?;
    write_bytes(dir.path(), "L1.pdf", b"garbage");

    let mut cfg = config(dir.path(), "^L", "out");
    cfg.dry_run = true;
    let report = run(&cfg).await?;

    assert!(!report.success);
    assert!(report.failure.is_some());
    Ok(())
}
