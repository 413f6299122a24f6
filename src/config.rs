use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use time::{Date, UtcOffset};
use tracing::debug;

use crate::ai::prompt::PromptTemplate;
use crate::cli::{BackendKind, Cli, OutputFormat};
use crate::git::CollectOptions;
use crate::time_utils::{DayWindow, parse_date, yesterday};
use crate::{AppError, AppResult};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const API_BASE_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "GIT_DAILY_REPORT_MODEL";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Load `.env` from the working directory (or a parent) and from the config
/// directory. Variables already set in the environment win.
///
/// Runs before argument parsing and logging setup, so the loaded paths are
/// returned for the caller to log.
pub fn load_env_files() -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }
    if let Ok(path) = git_daily_report_dirs::env_file()
        && path.is_file()
        && dotenvy::from_path(&path).is_ok()
    {
        loaded.push(path);
    }
    loaded
}

/// API key wrapper that keeps the secret out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(****)")
    }
}

/// Everything Remote mode needs, resolved up front.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub credential: Credential,
    pub model: String,
    pub api_base: Option<String>,
    pub timeout: Duration,
    pub template: PromptTemplate,
    pub show_prompt: bool,
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo: PathBuf,
    pub email: Option<String>,
    pub date: Date,
    pub offset: UtcOffset,
    pub backend: BackendKind,
    pub collect: CollectOptions,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    /// `Some` when Remote mode is on.
    pub remote: Option<RemoteSettings>,
}

impl Config {
    /// Combine the parsed arguments with environment lookups.
    ///
    /// The date is validated first and the credential second, so both fail
    /// before the repository is touched.
    #[tracing::instrument(name = "Resolving configuration", level = "debug", skip_all)]
    pub fn resolve<F>(cli: &Cli, env: F, local_offset: UtcOffset) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let offset = if cli.utc { UtcOffset::UTC } else { local_offset };
        let date = match &cli.date {
            Some(input) => parse_date(input)?,
            None => yesterday(offset),
        };
        debug!("Reporting on {} at offset {}", date, offset);

        let remote = if cli.use_gpt {
            Some(resolve_remote(cli, &env)?)
        } else {
            None
        };

        Ok(Self {
            repo: cli.repo.clone(),
            email: cli.email.clone(),
            date,
            offset,
            backend: cli.backend,
            collect: CollectOptions {
                include_remotes: cli.remotes,
                primary_branch: cli.primary_branch.clone(),
                exclusive: cli.exclusive,
            },
            format: cli.format,
            output: cli.output.clone(),
            remote,
        })
    }

    pub fn window(&self) -> DayWindow {
        DayWindow::new(self.date, self.offset)
    }
}

fn resolve_remote<F>(cli: &Cli, env: &F) -> AppResult<RemoteSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let credential = env(API_KEY_VAR)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .map(Credential)
        .ok_or_else(|| AppError::MissingCredential {
            hint: git_daily_report_dirs::env_file()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| git_daily_report_dirs::config_dir_hint()),
        })?;

    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let model = non_blank(cli.remote.model.clone())
        .or_else(|| non_blank(env(MODEL_VAR)))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let api_base = non_blank(cli.remote.api_base.clone()).or_else(|| non_blank(env(API_BASE_VAR)));
    let template = match &cli.remote.prompt_template {
        Some(path) => PromptTemplate::from_file(path)?,
        None => PromptTemplate::default(),
    };

    Ok(RemoteSettings {
        credential,
        model,
        api_base,
        timeout: cli.remote.timeout,
        template,
        show_prompt: cli.remote.show_prompt,
    })
}
