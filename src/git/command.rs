use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Output;

use time::UtcOffset;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use super::backend::{CommitRecord, VcsBackend, matches_author, sort_chronologically};
use crate::time_utils::{DayWindow, unix_seconds_to_datetime};
use crate::{AppError, AppResult};

const FIELD_SEP: char = '\x1f';
const LOG_FORMAT: &str = "--format=%H%x1f%ae%x1f%ct%x1f%s";
const REF_FORMAT: &str = "--format=%(refname)%09%(symref)";
const LOCAL_PREFIX: &str = "refs/heads/";
const REMOTE_PREFIX: &str = "refs/remotes/";

/// Backend driving the `git` executable as a subprocess.
pub struct GitCli {
    repo: PathBuf,
}

impl GitCli {
    /// Check that `path` is inside a work tree `git` recognises.
    #[tracing::instrument(name = "Opening git repository", level = "debug")]
    pub async fn open(path: &Path) -> AppResult<Self> {
        let cli = Self {
            repo: path.to_path_buf(),
        };
        match cli.run(&["rev-parse", "--git-dir"]).await {
            Ok(_) => Ok(cli),
            Err(AppError::GitCommand { stderr, .. }) => {
                debug!("git rejected {}: {}", path.display(), stderr);
                Err(AppError::RepositoryNotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn output(&self, args: &[&str]) -> AppResult<Output> {
        trace!("Running git -C {} {}", self.repo.display(), args.join(" "));
        Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    AppError::Other("The git executable was not found in PATH".to_string())
                }
                _ => e.into(),
            })
    }

    async fn run(&self, args: &[&str]) -> AppResult<String> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(AppError::GitCommand {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    /// Resolve a branch name to a commit hash, trying local branches first.
    async fn resolve(&self, branch: &str) -> AppResult<String> {
        for prefix in [LOCAL_PREFIX, REMOTE_PREFIX] {
            let rev = format!("{prefix}{branch}^{{commit}}");
            let output = self
                .output(&["rev-parse", "--verify", "--quiet", "--end-of-options", &rev])
                .await?;
            if output.status.success() {
                return Ok(String::from_utf8(output.stdout)?.trim().to_string());
            }
        }
        Err(AppError::GitCommand {
            command: format!("git rev-parse --verify {branch}"),
            stderr: format!("unknown branch '{branch}'"),
        })
    }

    async fn refs(&self, prefix: &str) -> AppResult<Vec<String>> {
        let namespace = prefix.trim_end_matches('/');
        let output = self.run(&["for-each-ref", REF_FORMAT, namespace]).await?;
        let mut names = parse_ref_names(&output, prefix);
        names.sort();
        Ok(names)
    }
}

impl VcsBackend for GitCli {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_branches(&self, include_remotes: bool) -> AppResult<Vec<String>> {
        let mut branches = self.refs(LOCAL_PREFIX).await?;
        if include_remotes {
            branches.extend(self.refs(REMOTE_PREFIX).await?);
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
        let tip = self.resolve(branch).await?;
        let author_arg = format!("--author={author}");
        // No `--since`/`--until`: git stops walking at the first commit older
        // than `--since`, and committer dates are not monotonic along history.
        let output = self
            .run(&[
                "log",
                "--fixed-strings",
                "--regexp-ignore-case",
                &author_arg,
                LOG_FORMAT,
                &tip,
            ])
            .await?;

        // `--author` is a substring match, so filter exactly here.
        let mut commits: Vec<_> = parse_log_records(&output, window.offset())?
            .into_iter()
            .filter(|c| matches_author(&c.author_email, author) && window.contains(&c.timestamp))
            .collect();
        sort_chronologically(&mut commits);
        Ok(commits)
    }

    async fn configured_email(&self) -> AppResult<Option<String>> {
        let output = self.output(&["config", "--get", "user.email"]).await?;
        if !output.status.success() {
            return Ok(None);
        }
        let email = String::from_utf8(output.stdout)?.trim().to_string();
        Ok((!email.is_empty()).then_some(email))
    }
}

/// Parse `for-each-ref` output of `<refname>\t<symref>` lines into short
/// branch names, dropping symbolic refs such as `origin/HEAD`.
fn parse_ref_names(output: &str, prefix: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let (refname, symref) = line.split_once('\t').unwrap_or((line, ""));
            if !symref.trim().is_empty() {
                trace!("Skipping symbolic ref {}", refname);
                return None;
            }
            let name = refname.trim().strip_prefix(prefix)?;
            if name.is_empty() || name == "HEAD" || name.ends_with("/HEAD") {
                return None;
            }
            Some(name.to_string())
        })
        .collect()
}

/// Parse `git log` records of `<hash> US <email> US <unix secs> US <subject>`.
fn parse_log_records(output: &str, offset: UtcOffset) -> AppResult<Vec<CommitRecord>> {
    let mut commits = Vec::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let mut fields = line.splitn(4, FIELD_SEP);
        let (Some(id), Some(email), Some(secs), Some(summary)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            warn!("Skipping malformed git log line: {:?}", line);
            continue;
        };
        commits.push(CommitRecord {
            id: id.trim().to_string(),
            author_email: email.trim().to_string(),
            timestamp: unix_seconds_to_datetime(secs.trim().parse()?, offset)?,
            summary: summary.trim().to_string(),
            branches: BTreeSet::new(),
        });
    }
    Ok(commits)
}
