//! Line-level edit scripts between two raw texts.
//!
//! Small inputs get a minimal script from a full LCS table. Inputs whose
//! line-count product exceeds the cell limit fall back to a single linear
//! pass that is NOT minimal: it aligns equal lines positionally and uses
//! set membership in the other text to decide between added and removed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Line-count product above which the LCS table is not built.
pub const DEFAULT_LCS_CELL_LIMIT: usize = 5_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub line_type: LineType,
    pub content: String,
    #[serde(rename = "oldLineNumber")]
    pub old_line_number: Option<u32>,
    #[serde(rename = "newLineNumber")]
    pub new_line_number: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Unchanged,
    Added,
    Removed,
}

impl DiffLine {
    fn unchanged(content: &str, old: usize, new: usize) -> Self {
        Self {
            line_type: LineType::Unchanged,
            content: content.to_owned(),
            old_line_number: Some(line_number(old)),
            new_line_number: Some(line_number(new)),
        }
    }

    fn added(content: &str, new: usize) -> Self {
        Self {
            line_type: LineType::Added,
            content: content.to_owned(),
            old_line_number: None,
            new_line_number: Some(line_number(new)),
        }
    }

    fn removed(content: &str, old: usize) -> Self {
        Self {
            line_type: LineType::Removed,
            content: content.to_owned(),
            old_line_number: Some(line_number(old)),
            new_line_number: None,
        }
    }
}

/// 1-based line number from a 0-based index.
fn line_number(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

/// Diff two texts line by line with the default cell limit.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    diff_lines_with_limit(old, new, DEFAULT_LCS_CELL_LIMIT)
}

pub fn diff_lines_with_limit(old: &str, new: &str, cell_limit: usize) -> Vec<DiffLine> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    if a.len().saturating_mul(b.len()) > cell_limit {
        log::debug!(
            "[diff] {}x{} lines exceeds the LCS limit, using linear pass",
            a.len(),
            b.len()
        );
        return linear_diff(&a, &b);
    }
    lcs_diff(&a, &b)
}

/// Count (added, removed) lines in an edit script.
pub fn count_changes(lines: &[DiffLine]) -> (u32, u32) {
    lines.iter().fold((0, 0), |(added, removed), line| match line.line_type {
        LineType::Added => (added + 1, removed),
        LineType::Removed => (added, removed + 1),
        LineType::Unchanged => (added, removed),
    })
}

fn lcs_diff(a: &[&str], b: &[&str]) -> Vec<DiffLine> {
    let (m, n) = (a.len(), b.len());
    let width = n + 1;
    // table[i * width + j] = LCS length of a[..i] and b[..j]
    let mut table = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            table[i * width + j] = if a[i - 1] == b[j - 1] {
                table[(i - 1) * width + j - 1] + 1
            } else {
                table[(i - 1) * width + j].max(table[i * width + j - 1])
            };
        }
    }

    let mut out = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1] == b[j - 1] {
            out.push(DiffLine::unchanged(a[i - 1], i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i * width + j - 1] >= table[(i - 1) * width + j]) {
            // Ties walk the new side first.
            out.push(DiffLine::added(b[j - 1], j - 1));
            j -= 1;
        } else {
            out.push(DiffLine::removed(a[i - 1], i - 1));
            i -= 1;
        }
    }
    out.reverse();
    out
}

fn linear_diff(a: &[&str], b: &[&str]) -> Vec<DiffLine> {
    let in_a: HashSet<&str> = a.iter().copied().collect();
    let in_b: HashSet<&str> = b.iter().copied().collect();

    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(DiffLine::unchanged(a[i], i, j));
            i += 1;
            j += 1;
        } else if !in_a.contains(b[j]) {
            out.push(DiffLine::added(b[j], j));
            j += 1;
        } else if !in_b.contains(a[i]) {
            out.push(DiffLine::removed(a[i], i));
            i += 1;
        } else {
            out.push(DiffLine::removed(a[i], i));
            out.push(DiffLine::added(b[j], j));
            i += 1;
            j += 1;
        }
    }
    out.extend((i..a.len()).map(|k| DiffLine::removed(a[k], k)));
    out.extend((j..b.len()).map(|k| DiffLine::added(b[k], k)));
    out
}
