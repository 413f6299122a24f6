use std::fmt::{Display, Formatter};

use serde::Serialize;
use time::Date;

use super::hist::BranchGroups;
use crate::AppResult;
use crate::cli::OutputFormat;
use crate::time_utils::clock;

/// The day's commits for one author, ready to print or to embed in a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct Report {
    #[serde(with = "crate::serde_helpers::date")]
    pub date: Date,
    pub author: String,
    pub branches: BranchGroups,
}

impl Report {
    pub fn new(date: Date, author: String, branches: BranchGroups) -> Self {
        Self {
            date,
            author,
            branches,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn render(&self, format: &OutputFormat) -> AppResult<String> {
        match format {
            OutputFormat::Text => Ok(self.to_string()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No commits by {} on {}.", self.author, self.date);
        }
        for (idx, group) in self.branches.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            writeln!(f, "🔀 Branch: {}", group.branch)?;
            for commit in &group.commits {
                writeln!(
                    f,
                    "• {} {} {}",
                    commit.short_id(),
                    clock(&commit.timestamp),
                    commit.summary
                )?;
            }
        }
        Ok(())
    }
}
