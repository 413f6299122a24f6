use std::collections::BTreeSet;

use serde::Serialize;
use time::OffsetDateTime;

use crate::AppResult;
use crate::time_utils::DayWindow;

/// One commit as reported by a backend's log query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct CommitRecord {
    pub id: String,
    pub author_email: String,
    #[serde(with = "crate::serde_helpers::offset_datetime")]
    pub timestamp: OffsetDateTime,
    pub summary: String,
    /// Every branch of the report this commit is listed under.
    #[serde(default)]
    pub branches: BTreeSet<String>,
}

impl CommitRecord {
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }
}

/// The queries the collector needs from a version-control system.
///
/// Implementations must return commits reachable from the branch tip, authored
/// by `author` (case-insensitive email match) and committed inside `window`,
/// ordered earliest first with ties broken by id.
#[allow(async_fn_in_trait)]
pub trait VcsBackend {
    /// Local branch names sorted by name, followed by the sorted remote-tracking
    /// branches when `include_remotes` is set. Symbolic `HEAD` refs are skipped.
    async fn list_branches(&self, include_remotes: bool) -> AppResult<Vec<String>>;

    async fn log_for_author_date(
        &self,
        branch: &str,
        author: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<CommitRecord>>;

    /// The `user.email` identity configured for the repository, if any.
    async fn configured_email(&self) -> AppResult<Option<String>>;
}

pub(crate) fn matches_author(email: &str, author: &str) -> bool {
    email.trim().eq_ignore_ascii_case(author.trim())
}

pub(crate) fn sort_chronologically(commits: &mut [CommitRecord]) {
    commits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}
