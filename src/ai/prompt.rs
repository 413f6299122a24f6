use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::git::Report;
use crate::{AppError, AppResult};

static DAILY_REPORT_PROMPT: &str = include_str!("prompts/daily_report.md");

/// A template for AI prompts that supports variable substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: Cow<'static, str>,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DAILY_REPORT_PROMPT)
    }
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self {
            template: Cow::Borrowed(template),
        }
    }

    /// Load a template from disk, e.g. one passed with `--prompt-template`.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let template =
            std::fs::read_to_string(path).map_err(|source| AppError::PromptTemplate {
                path: path.to_path_buf(),
                source,
            })?;
        if !template.contains("{{commits}}") {
            warn!(
                "Prompt template {} has no {{{{commits}}}} placeholder; the commits will be appended",
                path.display()
            );
        }
        Ok(Self {
            template: Cow::Owned(template),
        })
    }

    /// Render the template by replacing `{{key}}` with the corresponding value.
    ///
    /// The template is scanned once, so placeholders appearing inside a
    /// substituted value are left as they are. Unknown keys stay verbatim.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        let mut output = String::with_capacity(self.template.len());
        let mut rest = self.template.as_ref();
        while let Some(open) = rest.find("{{") {
            output.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                rest = &rest[open..];
                break;
            };
            match vars.get(&after[..close]) {
                Some(value) => output.push_str(value),
                None => output.push_str(&rest[open..open + 2 + close + 2]),
            }
            rest = &after[close + 2..];
        }
        output.push_str(rest);
        output
    }

    /// Prompt asking for a prose summary of `report`.
    pub fn render_report(&self, report: &Report) -> String {
        let commits = report.to_string();
        let date = report.date.to_string();
        let mut vars = HashMap::new();
        vars.insert("commits", commits.trim_end());
        vars.insert("date", date.as_str());
        vars.insert("author", report.author.as_str());

        let mut prompt = self.render(&vars);
        if !self.template.contains("{{commits}}") {
            prompt.push_str("\n\n");
            prompt.push_str(commits.trim_end());
            prompt.push('\n');
        }
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::backend::fake::{FakeBackend, commit};
    use crate::git::hist::{BranchGroups, CollectOptions, collect_commits};
    use crate::time_utils::DayWindow;
    use std::io::Write;
    use time::UtcOffset;
    use time::macros::{date, datetime};

    fn empty_report() -> Report {
        Report::new(
            date!(2024 - 06 - 01),
            "dev@x.com".to_string(),
            BranchGroups::default(),
        )
    }

    #[test]
    fn test_render() {
        let t = PromptTemplate::new("Hello {{name}}, welcome to {{place}}!");
        let mut vars = HashMap::new();
        vars.insert("name", "Alice");
        vars.insert("place", "Wonderland");
        assert_eq!(t.render(&vars), "Hello Alice, welcome to Wonderland!");
    }

    #[test]
    fn unknown_and_unclosed_placeholders_stay_verbatim() {
        let t = PromptTemplate::new("{{greeting}} {{name}}, {{open");
        let mut vars = HashMap::new();
        vars.insert("name", "Alice");
        assert_eq!(t.render(&vars), "{{greeting}} Alice, {{open");
    }

    #[test]
    fn values_are_not_substituted_again() {
        let t = PromptTemplate::new("{{date}}: {{commits}} by {{author}}");
        for _ in 0..32 {
            let mut vars = HashMap::new();
            vars.insert("commits", "Document {{date}} helper for {{author}}");
            vars.insert("date", "2024-06-01");
            vars.insert("author", "dev@x.com");
            assert_eq!(
                t.render(&vars),
                "2024-06-01: Document {{date}} helper for {{author}} by dev@x.com"
            );
        }
    }

    #[tokio::test]
    async fn commit_subjects_reach_the_prompt_untouched() {
        let backend = FakeBackend::default().with_branch(
            "main",
            vec![commit(
                "1a2b3c4d",
                "dev@x.com",
                datetime!(2024-06-01 09:15 UTC),
                "Document {{date}} helper",
            )],
        );
        let window = DayWindow::new(date!(2024 - 06 - 01), UtcOffset::UTC);
        let branches = collect_commits(&backend, "dev@x.com", &window, &CollectOptions::default())
            .await
            .unwrap();
        let report = Report::new(date!(2024 - 06 - 01), "dev@x.com".to_string(), branches);

        let prompt = PromptTemplate::default().render_report(&report);
        assert!(prompt.contains("• 1a2b3c4 09:15 Document {{date}} helper"));
        assert!(prompt.contains("made by dev@x.com on 2024-06-01"));
    }

    #[test]
    fn builtin_template_embeds_report() {
        let prompt = PromptTemplate::default().render_report(&empty_report());
        assert!(prompt.contains("No commits by dev@x.com on 2024-06-01."));
        assert!(prompt.contains("made by dev@x.com on 2024-06-01"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn template_without_placeholder_gets_commits_appended() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Summarize my day for {{{{date}}}}.").unwrap();
        let template = PromptTemplate::from_file(file.path()).unwrap();
        assert_eq!(
            template.render_report(&empty_report()),
            "Summarize my day for 2024-06-01.\n\nNo commits by dev@x.com on 2024-06-01.\n"
        );
    }

    #[test]
    fn missing_template_file_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("prompt.md");
        assert!(matches!(
            PromptTemplate::from_file(&missing),
            Err(AppError::PromptTemplate { path, .. }) if path == missing
        ));
    }
}
