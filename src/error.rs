use std::path::PathBuf;

use thiserror::Error;

/// Unified application error type to simplify bubbling errors through async flows.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not a git repository: {}", path.display())]
    RepositoryNotFound { path: PathBuf },
    #[error("Invalid date '{input}'. Use YYYY-MM-DD.")]
    InvalidDate { input: String },
    #[error(
        "No author email given and git user.email is not configured. Pass --email or run: git config user.email 'you@example.com'"
    )]
    AuthorNotConfigured,
    #[error(
        "OPENAI_API_KEY is not set. Export it, or add OPENAI_API_KEY=<key> to a .env file in the working directory or in {hint}"
    )]
    MissingCredential { hint: String },
    #[error("Remote text generation failed. {0}")]
    RemoteCall(String),
    #[error("`{command}` failed. {stderr}")]
    GitCommand { command: String, stderr: String },
    #[error("Error from git. {0}")]
    Git(#[from] git2::Error),
    #[error("Errored while handling a file. {0}")]
    Command(#[from] std::io::Error),
    #[error("Unable to read prompt template {}. {source}", path.display())]
    PromptTemplate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Error parsing a number. {0}")]
    Parse(#[from] std::num::ParseIntError),
    #[error("Error serializing json. {0}")]
    SerdeJsonSer(#[from] serde_json::Error),
    #[error("Unable to parse string. {0}")]
    Utf8Parse(#[from] std::string::FromUtf8Error),
    #[error("Timestamp out of range. {0}")]
    Timestamp(#[from] time::error::ComponentRange),
    #[error("{0}")]
    Other(String),
}

impl From<async_openai::error::OpenAIError> for AppError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        AppError::RemoteCall(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::RemoteCall(err.to_string())
    }
}

/// Convenience alias for results that bubble `AppError`.
pub type AppResult<T> = Result<T, AppError>;
