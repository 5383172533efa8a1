//! Prompt templates for the review agent.

const SYSTEM_PROMPT_BASE: &str = r#"You are an expert code reviewer for pull requests. Your role is to analyze code changes and provide helpful, actionable feedback.

## Review Guidelines

1. **Focus on Changed Code**: Only review the lines that have been added or modified. Do not comment on unchanged code.
2. **Be Specific**: Reference specific line numbers and code snippets in your feedback.
3. **Be Constructive**: Offer solutions or alternatives when pointing out issues.
4. **Severity Levels**: error (must fix), warning (should fix), info (suggestion), praise (positive feedback).
5. **Categories**: bug, security, performance, style, best_practice, documentation.

## Output Format

Respond with a single JSON object:

{
  "summary": "<one-paragraph review summary>",
  "comments": [
    {
      "line": <new-file line number of an added line>,
      "severity": "error|warning|info|praise",
      "category": "bug|security|performance|style|best_practice|documentation",
      "body": "<the comment text>"
    }
  ]
}

## Important Notes

- Do NOT suggest changes to files not included in the diff
- Do NOT comment on unchanged lines; use NEW file line numbers from the diff
- Be respectful and professional
- Acknowledge good code and patterns with praise comments"#;

/// System prompt, with the repository's custom rules appended when present.
pub fn build_system_prompt(custom_rules: Option<&str>) -> String {
    match custom_rules {
        Some(rules) if !rules.trim().is_empty() => format!(
            r#"{base}

## Custom Rules

The repository has defined the following custom review rules that MUST be enforced:

{rules}"#,
            base = SYSTEM_PROMPT_BASE,
            rules = rules,
        ),
        _ => SYSTEM_PROMPT_BASE.to_string(),
    }
}

/// Per-file review prompt.
pub fn build_review_prompt(
    pr_title: &str,
    pr_body: Option<&str>,
    file_path: &str,
    file_diff: &str,
) -> String {
    format!(
        r#"## Pull Request Context

**Title**: {title}
**Description**: {body}

## File to Review

**Path**: {path}

### Diff

```diff
{diff}
```

## Your Task

Review the changes shown in the diff above. Focus on potential bugs, security vulnerabilities, performance issues, readability, and best practices. Report findings in the JSON format from your instructions, anchored to NEW file line numbers of added lines. If the code looks good, return an empty comments array with a brief praise summary."#,
        title = pr_title,
        body = pr_body.unwrap_or("(no description)"),
        path = file_path,
        diff = file_diff,
    )
}

/// Overall summary prompt built from per-file outcomes.
pub fn build_summary_prompt(
    pr_title: &str,
    pr_body: Option<&str>,
    file_results: &[(String, String)],
) -> String {
    let files = file_results
        .iter()
        .map(|(path, summary)| format!("- **{}**: {}", path, summary))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"## Pull Request

**Title**: {title}
**Description**: {body}

## Per-File Review Results

{files}

## Your Task

Write a concise overall review summary for this pull request (plain markdown, no JSON). Mention the most important findings first and keep it under 200 words."#,
        title = pr_title,
        body = pr_body.unwrap_or("(no description)"),
        files = files,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_without_rules() {
        let prompt = build_system_prompt(None);
        assert!(prompt.contains("expert code reviewer"));
        assert!(!prompt.contains("Custom Rules"));
    }

    #[test]
    fn test_system_prompt_with_rules() {
        let prompt = build_system_prompt(Some("### Security\nNo plaintext secrets."));
        assert!(prompt.contains("## Custom Rules"));
        assert!(prompt.contains("No plaintext secrets."));
    }

    #[test]
    fn test_blank_rules_ignored() {
        assert!(!build_system_prompt(Some("   ")).contains("Custom Rules"));
    }

    #[test]
    fn test_review_prompt_includes_diff() {
        let prompt = build_review_prompt("Add parser", None, "src/diff.rs", "@@ -1 +1 @@\n-a\n+b");
        assert!(prompt.contains("**Path**: src/diff.rs"));
        assert!(prompt.contains("```diff\n@@ -1 +1 @@"));
        assert!(prompt.contains("(no description)"));
    }

    #[test]
    fn test_summary_prompt_lists_files() {
        let results = vec![
            ("a.rs".to_string(), "2 comment(s)".to_string()),
            ("b.png".to_string(), "Skipped: Binary file".to_string()),
        ];
        let prompt = build_summary_prompt("Title", Some("Body"), &results);
        assert!(prompt.contains("- **a.rs**: 2 comment(s)"));
        assert!(prompt.contains("- **b.png**: Skipped: Binary file"));
    }
}
