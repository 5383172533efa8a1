//! Unified diff parsing for the review pipeline.
//!
//! Everything that anchors a review comment to a file line flows through
//! here: GitHub's `patch` field is split into hunks, hunk bodies are
//! classified into added/removed lines with their file line numbers, and
//! legacy diff positions are translated back to new-file line numbers.
//!
//! Malformed or absent input is never an error — binary files have no
//! patch, and a patch with no recognizable hunks simply yields nothing.
//! The functions here are pure and hold no state between calls.

use regex::Regex;
use std::sync::LazyLock;

/// Matches a hunk header: `@@ -old_start,old_count +new_start,new_count @@`.
/// The count groups are optional; unified diff elides a count of 1.
static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@")
        .expect("hunk header pattern is valid")
});

/// Whether a changed line was added or removed.
///
/// Context lines are not materialized as [`ChangedLine`]s; they only
/// advance the line counters during classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChangeType {
    Added,
    Removed,
}

/// A single added or removed line, with its file line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedLine {
    pub change_type: LineChangeType,
    /// Line text with the `+`/`-` prefix stripped.
    pub content: String,
    /// Set only for removed lines (old-file coordinates, LEFT side).
    pub old_line_number: Option<u32>,
    /// Set only for added lines (new-file coordinates, RIGHT side).
    pub new_line_number: Option<u32>,
}

impl ChangedLine {
    fn added(content: &str, new_line: u32) -> Self {
        Self {
            change_type: LineChangeType::Added,
            content: content.to_string(),
            old_line_number: None,
            new_line_number: Some(new_line),
        }
    }

    fn removed(content: &str, old_line: u32) -> Self {
        Self {
            change_type: LineChangeType::Removed,
            content: content.to_string(),
            old_line_number: Some(old_line),
            new_line_number: None,
        }
    }
}

/// One contiguous change region of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    /// 1-indexed start line in the old file; 0 for a pure addition.
    pub old_start: u32,
    pub old_count: u32,
    /// 1-indexed start line in the new file; 0 for a pure deletion.
    pub new_start: u32,
    pub new_count: u32,
    /// The raw `@@ ... @@` line, kept for diagnostics.
    pub header: String,
    /// Raw body lines, each prefixed with `+`, `-`, ` `, or `\`.
    pub lines: Vec<String>,
}

impl DiffHunk {
    /// New file or insertion into an empty region.
    pub fn is_pure_addition(&self) -> bool {
        self.old_count == 0 && self.new_count > 0
    }

    /// Deleted file or removal of an entire region.
    pub fn is_pure_deletion(&self) -> bool {
        self.old_count > 0 && self.new_count == 0
    }
}

fn parse_count(group: Option<regex::Match<'_>>) -> u32 {
    group.and_then(|m| m.as_str().parse().ok()).unwrap_or(1)
}

/// Split a patch into hunks.
///
/// `None` (binary file) and the empty string both yield an empty vec.
/// Lines before the first hunk header are discarded. Header counts are
/// trusted as-is: nothing checks that `old_count`/`new_count` match the
/// number of body lines, so downstream code must not assume they agree.
pub fn parse_unified_diff(patch: Option<&str>) -> Vec<DiffHunk> {
    let Some(patch) = patch else {
        return Vec::new();
    };
    if patch.is_empty() {
        return Vec::new();
    }

    let mut hunks: Vec<DiffHunk> = Vec::new();
    let mut current: Option<DiffHunk> = None;

    for line in patch.split('\n') {
        if let Some(caps) = HUNK_HEADER.captures(line) {
            if let Some(hunk) = current.take() {
                hunks.push(hunk);
            }

            // The start groups always match, so the parses cannot fail
            // for a `\d+` capture; default to 0 rather than panic.
            let old_start = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            let new_start = caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);

            current = Some(DiffHunk {
                old_start,
                old_count: parse_count(caps.get(2)),
                new_start,
                new_count: parse_count(caps.get(4)),
                header: line.to_string(),
                lines: Vec::new(),
            });
        } else if let Some(hunk) = current.as_mut() {
            hunk.lines.push(line.to_string());
        }
    }

    if let Some(hunk) = current.take() {
        hunks.push(hunk);
    }

    hunks
}

/// Extract the added and removed lines from a patch, in document order.
///
/// Each hunk resets its own line cursors from its header; counters never
/// carry over between hunks. Context lines advance both cursors without
/// producing output, and the `\ No newline at end of file` marker advances
/// neither.
pub fn extract_changed_lines(patch: Option<&str>) -> Vec<ChangedLine> {
    let mut changed = Vec::new();

    for hunk in parse_unified_diff(patch) {
        let mut old_line = hunk.old_start;
        let mut new_line = hunk.new_start;

        for line in &hunk.lines {
            if line.is_empty() {
                continue;
            }

            let content = line.get(1..).unwrap_or("");
            match line.as_bytes()[0] {
                b'+' => {
                    changed.push(ChangedLine::added(content, new_line));
                    new_line += 1;
                }
                b'-' => {
                    changed.push(ChangedLine::removed(content, old_line));
                    old_line += 1;
                }
                b' ' => {
                    old_line += 1;
                    new_line += 1;
                }
                // `\` marker or an unexpected prefix: nothing to emit,
                // no cursor movement.
                _ => {}
            }
        }
    }

    changed
}

/// Map a 1-indexed diff position to a new-file line number.
///
/// "Position" is GitHub's legacy addressing for review comments: the
/// physical line index within the whole patch text, headers included.
/// Returns `None` when the position is out of range or lands on a removed
/// line, which has no new-file counterpart to anchor a comment to.
///
/// This walks the raw patch text with its own counters instead of reusing
/// [`parse_unified_diff`]: position counting runs continuously across
/// hunk headers while the line counter resets at each one, and the two
/// traversals are easier to keep correct apart than merged.
pub fn line_at_position(patch: Option<&str>, position: usize) -> Option<u32> {
    let patch = patch?;
    if patch.is_empty() {
        return None;
    }

    let lines: Vec<&str> = patch.split('\n').collect();
    if position < 1 || position > lines.len() {
        return None;
    }

    let mut current_position = 0usize;
    let mut new_line = 0u32;

    for line in lines {
        current_position += 1;

        if let Some(caps) = HUNK_HEADER.captures(line) {
            new_line = caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            continue;
        }

        if current_position == position {
            return if line.starts_with('+') || line.starts_with(' ') {
                Some(new_line)
            } else {
                None
            };
        }

        // Everything except a removal occupies a line in the new file.
        if !line.starts_with('-') {
            new_line += 1;
        }
    }

    None
}
