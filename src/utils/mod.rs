//! Utilities for ordering file names and formatting sizes.

use std::cmp::Ordering;

/// One run of a file name, as compared by [`natural_cmp`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    /// Digit run: significant digit count, then the significant digits.
    Number(usize, String),
    /// Non-digit run, lowercased.
    Text(String),
}

/// Split a name into digit and non-digit runs.
fn chunks(name: &str) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    let flush = |current: &mut String, in_digits: bool, out: &mut Vec<Chunk>| {
        if current.is_empty() {
            return;
        }
        let run = std::mem::take(current);
        if in_digits {
            let significant = run.trim_start_matches('0');
            out.push(Chunk::Number(significant.len(), significant.to_string()));
        } else {
            out.push(Chunk::Text(run.to_lowercase()));
        }
    };

    for ch in name.chars() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != in_digits {
            flush(&mut current, in_digits, &mut out);
            in_digits = is_digit;
        }
        current.push(ch);
    }
    flush(&mut current, in_digits, &mut out);

    out
}

/// Compare two names in natural order.
///
/// Digit runs compare by numeric value (without overflow, however long),
/// other runs case-insensitively. Names that are equal under that rule fall
/// back to plain string order so the result is total.
///
/// # Examples
///
/// ```
/// use pdfgather::utils::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("L2.pdf", "L10.pdf"), Ordering::Less);
/// assert_eq!(natural_cmp("l2.pdf", "L2.pdf"), Ordering::Greater);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(&chunks(b)).then_with(|| a.cmp(b))
}

/// Format file size as human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
