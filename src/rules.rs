//! Custom review rules.
//!
//! Repositories can ship extra review guidance as markdown files under
//! their rules directory (default `.claude/rules`). Files load in
//! alphabetical order, which defines rule priority, and merge into one
//! section of the system prompt.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// A single rule file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRule {
    /// Filename the rule came from.
    pub source_file: String,
    /// Raw markdown content.
    pub content: String,
    /// Load order (0-indexed, alphabetical).
    pub priority: usize,
}

impl ReviewRule {
    /// Title from the first markdown heading, else the file stem.
    pub fn title(&self) -> String {
        let first_line = self.content.trim().lines().next().unwrap_or("").trim();
        if let Some(heading) = first_line.strip_prefix('#') {
            return heading.trim_start_matches('#').trim().to_string();
        }
        self.source_file
            .rsplit_once('.')
            .map(|(stem, _)| stem.to_string())
            .unwrap_or_else(|| self.source_file.clone())
    }
}

/// Load all `*.md` rules from a directory.
///
/// A missing directory is normal (most repos have no custom rules) and
/// yields an empty list. Unreadable or empty files are skipped with a
/// warning rather than failing the whole review.
pub fn load_rules(rules_dir: &Path) -> Vec<ReviewRule> {
    if !rules_dir.exists() {
        debug!(path = %rules_dir.display(), "rules directory does not exist");
        return Vec::new();
    }
    if !rules_dir.is_dir() {
        warn!(path = %rules_dir.display(), "rules path is not a directory");
        return Vec::new();
    }

    let mut filenames: Vec<_> = match fs::read_dir(rules_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == "md")
            })
            .collect(),
        Err(e) => {
            warn!(path = %rules_dir.display(), error = %e, "failed to read rules directory");
            return Vec::new();
        }
    };
    filenames.sort();

    let mut rules = Vec::new();
    for path in filenames {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read rule file");
                continue;
            }
        };
        if content.trim().is_empty() {
            warn!(path = %path.display(), "skipping empty rule file");
            continue;
        }

        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(file = %source_file, priority = rules.len(), "loaded rule");
        rules.push(ReviewRule {
            source_file,
            content,
            priority: rules.len(),
        });
    }

    info!(directory = %rules_dir.display(), rule_count = rules.len(), "loaded rules");
    rules
}

/// Merge rules into one prompt section, separated by horizontal rules.
pub fn merge_rules(rules: &[ReviewRule]) -> String {
    let mut sorted: Vec<&ReviewRule> = rules.iter().collect();
    sorted.sort_by_key(|r| r.priority);

    sorted
        .iter()
        .map(|rule| format!("### {}\n\n{}", rule.title(), rule.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Load and merge custom rules from a repository checkout.
pub fn load_rules_from_repo(repo_root: &Path, rules_path: &str) -> String {
    merge_rules(&load_rules(&repo_root.join(rules_path)))
}
