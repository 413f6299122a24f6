use std::collections::BTreeSet;
use std::path::Path;

use git2::{BranchType, ErrorCode, Oid, Repository, Sort};
use tracing::{debug, trace};

use super::backend::{CommitRecord, VcsBackend, matches_author, sort_chronologically};
use crate::time_utils::{DayWindow, unix_seconds_to_datetime};
use crate::{AppError, AppResult};

/// Backend reading the repository in-process through libgit2.
pub struct LibGit {
    repo: Repository,
}

impl LibGit {
    /// Open the repository containing `path`.
    #[tracing::instrument(name = "Opening git repository", level = "debug")]
    pub fn open(path: &Path) -> AppResult<Self> {
        let repo = Repository::discover(path).map_err(|e| {
            debug!("No repository found at {}: {}", path.display(), e);
            AppError::RepositoryNotFound {
                path: path.to_path_buf(),
            }
        })?;
        Ok(Self { repo })
    }

    fn branch_names(&self, kind: BranchType) -> AppResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in self.repo.branches(Some(kind))? {
            let (branch, _) = entry?;
            match branch.name()? {
                Some(name) if name == "HEAD" || name.ends_with("/HEAD") => {
                    trace!("Skipping symbolic ref {}", name);
                }
                Some(name) => names.push(name.to_string()),
                None => debug!("Skipping branch with a non UTF-8 name"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn tip(&self, branch: &str) -> AppResult<Oid> {
        let found = self
            .repo
            .find_branch(branch, BranchType::Local)
            .or_else(|_| self.repo.find_branch(branch, BranchType::Remote))?;
        Ok(found.get().peel_to_commit()?.id())
    }
}

impl VcsBackend for LibGit {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_branches(&self, include_remotes: bool) -> AppResult<Vec<String>> {
        let mut branches = self.branch_names(BranchType::Local)?;
        if include_remotes {
            branches.extend(self.branch_names(BranchType::Remote)?);
        }
        debug!("Found {} branches", branches.len());
        Ok(branches)
    }

    #[tracing::instrument(level = "debug", skip(self, window))]
    async fn log_for_author_date(
        &self,
        branch: &str,
        author: &str,
        window: &DayWindow,
    ) -> AppResult<Vec<CommitRecord>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(self.tip(branch)?)?;

        let mut commits = Vec::new();
        // Committer dates are not monotonic along history, so walk everything.
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let timestamp = unix_seconds_to_datetime(commit.time().seconds(), window.offset())?;
            if !window.contains(&timestamp) {
                continue;
            }
            let signature = commit.author();
            let Some(email) = signature.email() else {
                continue;
            };
            if !matches_author(email, author) {
                continue;
            }
            trace!("Matched commit {} on {}", commit.id(), branch);
            commits.push(CommitRecord {
                id: commit.id().to_string(),
                author_email: email.to_string(),
                timestamp,
                summary: commit.summary().unwrap_or_default().to_string(),
                branches: BTreeSet::new(),
            });
        }
        sort_chronologically(&mut commits);
        Ok(commits)
    }

    async fn configured_email(&self) -> AppResult<Option<String>> {
        match self.repo.config()?.get_string("user.email") {
            Ok(email) if !email.trim().is_empty() => Ok(Some(email.trim().to_string())),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    use git2::{Oid, Repository, Signature, Time};
    use tempfile::TempDir;
    use time::OffsetDateTime;

    /// Throwaway repository with helpers to commit at fixed times.
    pub(crate) struct Fixture {
        pub dir: TempDir,
        pub repo: Repository,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let repo = Repository::init(dir.path()).unwrap();
            Self { dir, repo }
        }

        /// Commit an empty tree onto `refs/heads/<branch>`, creating the branch if needed.
        pub(crate) fn commit(
            &self,
            branch: &str,
            email: &str,
            at: OffsetDateTime,
            message: &str,
        ) -> Oid {
            let reference = format!("refs/heads/{branch}");
            let parent = self
                .repo
                .find_reference(&reference)
                .ok()
                .and_then(|r| r.peel_to_commit().ok());
            let when = Time::new(at.unix_timestamp(), at.offset().whole_minutes() as i32);
            let sig = Signature::new("Dev", email, &when).unwrap();
            let tree_id = self.repo.treebuilder(None).unwrap().write().unwrap();
            let tree = self.repo.find_tree(tree_id).unwrap();
            let parents: Vec<_> = parent.iter().collect();
            self.repo
                .commit(Some(&reference), &sig, &sig, message, &tree, &parents)
                .unwrap()
        }

        /// Create `branch` pointing at the current tip of `from`.
        pub(crate) fn branch(&self, branch: &str, from: &str) {
            let tip = self
                .repo
                .find_branch(from, git2::BranchType::Local)
                .unwrap()
                .get()
                .peel_to_commit()
                .unwrap();
            self.repo.branch(branch, &tip, false).unwrap();
        }

        pub(crate) fn set_email(&self, email: &str) {
            self.repo.config().unwrap().set_str("user.email", email).unwrap();
        }
    }
}
