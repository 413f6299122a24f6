use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirError {
    #[error("Directory not found: {0}")]
    DirNotFound(String),
}

pub type DirResult<T> = Result<T, DirError>;

/// Application name used to namespace directories.
pub static APP_NAME: &str = "git-daily-report";

/// Name of the untracked key-value file holding secrets such as the API key.
pub static ENV_FILE: &str = ".env";

/// Pretty-printed default location of the config directory, for messages.
pub fn config_dir_hint() -> String {
    format!("~/.config/{}", APP_NAME)
}

/// Resolve the config directory from `XDG_CONFIG_HOME`, falling back to
/// `$HOME/.config` (or `%USERPROFILE%\.config`).
pub fn config_dir() -> DirResult<PathBuf> {
    resolve_config_dir(
        env::var_os("XDG_CONFIG_HOME"),
        env::var_os("HOME").or_else(|| env::var_os("USERPROFILE")),
    )
}

/// Path of the `.env` file inside the config directory. The file may not exist.
pub fn env_file() -> DirResult<PathBuf> {
    Ok(config_dir()?.join(ENV_FILE))
}

fn resolve_config_dir(xdg: Option<OsString>, home: Option<OsString>) -> DirResult<PathBuf> {
    if let Some(dir) = xdg.filter(|dir| !dir.is_empty()) {
        Ok(PathBuf::from(dir).join(APP_NAME))
    } else if let Some(home) = home.filter(|home| !home.is_empty()) {
        Ok(PathBuf::from(home).join(".config").join(APP_NAME))
    } else {
        Err(DirError::DirNotFound(config_dir_hint()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_xdg_config_home() {
        let dir = resolve_config_dir(Some("/xdg".into()), Some("/home/dev".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/xdg").join(APP_NAME));
    }

    #[test]
    fn falls_back_to_home() {
        let dir = resolve_config_dir(Some("".into()), Some("/home/dev".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/home/dev/.config").join(APP_NAME));
    }

    #[test]
    fn errors_without_any_hint() {
        let err = resolve_config_dir(None, None).unwrap_err();
        assert!(err.to_string().contains(APP_NAME));
    }
}
