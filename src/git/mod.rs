/// The backend interface and the commit record it produces.
pub mod backend;

/// `git` subprocess backend.
pub mod command;

/// Branch grouping and dedup of the day's commits.
pub mod hist;

/// libgit2 backend.
pub mod libgit;

/// Text and JSON rendering of the grouped commits.
pub mod report;

pub(crate) use backend::VcsBackend;
pub(crate) use command::GitCli;
pub(crate) use hist::{CollectOptions, collect_commits, resolve_author};
pub(crate) use libgit::LibGit;
pub(crate) use report::Report;
