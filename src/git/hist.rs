use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::backend::{CommitRecord, VcsBackend};
use crate::time_utils::DayWindow;
use crate::{AppError, AppResult};

/// How branches are walked and how shared commits are attributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectOptions {
    pub include_remotes: bool,
    /// Branch listed before every other one.
    pub primary_branch: Option<String>,
    /// List each commit only under the first branch that reports it.
    pub exclusive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct BranchGroup {
    pub branch: String,
    pub commits: Vec<CommitRecord>,
}

/// Non-empty branch groups in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(transparent)]
pub struct BranchGroups(Vec<BranchGroup>);

impl BranchGroups {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BranchGroup> {
        self.0.iter()
    }

    #[cfg(test)]
    pub fn get(&self, branch: &str) -> Option<&[CommitRecord]> {
        self.0
            .iter()
            .find(|g| g.branch == branch)
            .map(|g| g.commits.as_slice())
    }

    #[cfg(test)]
    pub fn branches(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|g| g.branch.as_str())
    }

    pub fn commit_count(&self) -> usize {
        self.0.iter().map(|g| g.commits.len()).sum()
    }
}

/// Use `email` when given, otherwise the identity configured in the repository.
#[tracing::instrument(level = "debug", skip(backend))]
pub async fn resolve_author<B: VcsBackend>(backend: &B, email: Option<&str>) -> AppResult<String> {
    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        return Ok(email.to_string());
    }
    let configured = backend.configured_email().await?;
    debug!("Configured author email: {:?}", configured);
    configured.ok_or(AppError::AuthorNotConfigured)
}

fn order_branches(branches: Vec<String>, primary: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered: Vec<String> = branches
        .into_iter()
        .filter(|b| seen.insert(b.clone()))
        .collect();
    if let Some(primary) = primary {
        match ordered.iter().position(|b| b == primary) {
            Some(idx) => {
                let branch = ordered.remove(idx);
                ordered.insert(0, branch);
            }
            None => warn!("Primary branch {} does not exist", primary),
        }
    }
    ordered
}

/// Query every branch for `author`'s commits inside `window` and group them.
///
/// A commit shows up under each branch it is reachable from, at most once per
/// branch, unless `options.exclusive` is set. Branches without commits are
/// omitted.
#[tracing::instrument(
    name = "Collecting commits",
    level = "info",
    skip(backend, window, options),
    fields(date = %window.date)
)]
pub async fn collect_commits<B: VcsBackend>(
    backend: &B,
    author: &str,
    window: &DayWindow,
    options: &CollectOptions,
) -> AppResult<BranchGroups> {
    let branches = order_branches(
        backend.list_branches(options.include_remotes).await?,
        options.primary_branch.as_deref(),
    );

    let mut claimed = HashSet::new();
    let mut groups = Vec::new();
    for branch in branches {
        let mut seen = HashSet::new();
        let mut commits = Vec::new();
        for commit in backend.log_for_author_date(&branch, author, window).await? {
            if !seen.insert(commit.id.clone()) {
                trace!("Dropping repeated commit {} on {}", commit.id, branch);
                continue;
            }
            if options.exclusive && !claimed.insert(commit.id.clone()) {
                trace!("Commit {} already listed under an earlier branch", commit.id);
                continue;
            }
            commits.push(commit);
        }
        if commits.is_empty() {
            debug!("No matching commits on {}", branch);
            continue;
        }
        groups.push(BranchGroup { branch, commits });
    }

    let mut membership: HashMap<String, BTreeSet<String>> = HashMap::new();
    for group in &groups {
        for commit in &group.commits {
            membership
                .entry(commit.id.clone())
                .or_default()
                .insert(group.branch.clone());
        }
    }
    for group in &mut groups {
        for commit in &mut group.commits {
            if let Some(branches) = membership.get(&commit.id) {
                commit.branches = branches.clone();
            }
        }
    }

    let groups = BranchGroups(groups);
    info!(
        "Found {} commits on {} branches",
        groups.commit_count(),
        groups.len()
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::backend::fake::{FakeBackend, commit};
    use time::UtcOffset;
    use time::macros::{date, datetime};

    fn window() -> DayWindow {
        DayWindow::new(date!(2024 - 06 - 01), UtcOffset::UTC)
    }

    fn shared() -> CommitRecord {
        commit("c0ffee1", "a@x.com", datetime!(2024-06-01 09:00 UTC), "Shared work")
    }

    #[tokio::test]
    async fn shared_commit_is_listed_once_per_branch() {
        let feature_only = commit("feed001", "a@x.com", datetime!(2024-06-01 11:00 UTC), "Feature");
        let backend = FakeBackend::default()
            .with_branch("main", vec![shared(), shared()])
            .with_branch("feature", vec![shared(), feature_only, shared()]);

        let groups = collect_commits(&backend, "a@x.com", &window(), &CollectOptions::default())
            .await
            .unwrap();

        let main = groups.get("main").unwrap();
        assert_eq!(main.len(), 1);
        assert_eq!(main[0].id, "c0ffee1");
        let feature: Vec<_> = groups.get("feature").unwrap().iter().map(|c| &c.id).collect();
        assert_eq!(feature, ["c0ffee1", "feed001"]);
        assert_eq!(
            main[0].branches.iter().collect::<Vec<_>>(),
            ["feature", "main"]
        );
    }

    #[tokio::test]
    async fn empty_branches_are_omitted() {
        let backend = FakeBackend::default()
            .with_branch("main", vec![shared()])
            .with_branch("stale", vec![])
            .with_branch(
                "other-author",
                vec![commit("0ther01", "b@x.com", datetime!(2024-06-01 09:00 UTC), "Theirs")],
            );

        let groups = collect_commits(&backend, "a@x.com", &window(), &CollectOptions::default())
            .await
            .unwrap();
        assert_eq!(groups.branches().collect::<Vec<_>>(), ["main"]);
    }

    #[tokio::test]
    async fn nothing_on_the_day_gives_empty_groups() {
        let backend = FakeBackend::default().with_branch(
            "main",
            vec![commit("01d0001", "a@x.com", datetime!(2024-05-30 09:00 UTC), "Old")],
        );
        let groups = collect_commits(&backend, "a@x.com", &window(), &CollectOptions::default())
            .await
            .unwrap();
        assert!(groups.is_empty());
        assert_eq!(groups.commit_count(), 0);
    }

    #[tokio::test]
    async fn exclusive_keeps_first_branch_only() {
        let backend = FakeBackend::default()
            .with_branch("feature", vec![shared()])
            .with_branch("develop", vec![shared()]);
        let options = CollectOptions {
            primary_branch: Some("develop".to_string()),
            exclusive: true,
            ..Default::default()
        };

        let groups = collect_commits(&backend, "a@x.com", &window(), &options)
            .await
            .unwrap();
        assert_eq!(groups.branches().collect::<Vec<_>>(), ["develop"]);
        assert_eq!(groups.get("develop").unwrap()[0].branches.len(), 1);
    }

    #[tokio::test]
    async fn remotes_are_queried_only_on_request() {
        let mut backend = FakeBackend::default().with_branch("main", vec![shared()]);
        backend.remote_branches.push("origin/main".to_string());
        backend.logs.insert("origin/main".to_string(), vec![shared()]);

        let local = collect_commits(&backend, "a@x.com", &window(), &CollectOptions::default())
            .await
            .unwrap();
        assert_eq!(local.len(), 1);

        let options = CollectOptions {
            include_remotes: true,
            ..Default::default()
        };
        let all = collect_commits(&backend, "a@x.com", &window(), &options)
            .await
            .unwrap();
        assert_eq!(all.branches().collect::<Vec<_>>(), ["main", "origin/main"]);
    }

    #[test]
    fn primary_branch_moves_to_front() {
        let branches = vec!["a".to_string(), "develop".to_string(), "a".to_string()];
        assert_eq!(order_branches(branches.clone(), Some("develop")), ["develop", "a"]);
        assert_eq!(order_branches(branches, Some("missing")), ["a", "develop"]);
    }

    #[tokio::test]
    async fn explicit_email_wins_over_configuration() {
        let backend = FakeBackend {
            email: Some("config@x.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_author(&backend, Some(" cli@x.com ")).await.unwrap(),
            "cli@x.com"
        );
        assert_eq!(resolve_author(&backend, None).await.unwrap(), "config@x.com");
    }

    #[tokio::test]
    async fn missing_identity_is_reported() {
        let backend = FakeBackend::default();
        assert!(matches!(
            resolve_author(&backend, Some("  ")).await,
            Err(AppError::AuthorNotConfigured)
        ));
    }
}
