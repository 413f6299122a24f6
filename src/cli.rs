use std::path::PathBuf;
use std::time::Duration;

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Args, Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

const STYLES: Styles = Styles::styled()
    .header(Style::new().bold())
    .usage(Style::new().bold())
    .error(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
    .literal(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Green))),
    )
    .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
    .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
    .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightRed))))
    .context(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))))
    .context_value(
        Style::new()
            .bold()
            .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
    );

/// Long-form CLI description shown in `--help`.
const LONG_ABOUT: &str = "Git Daily Report - show the git commits you made on a given day

The commits are grouped by the branches they are reachable from. With
--use-gpt the list is sent to an OpenAI-compatible API, which writes a short
prose report instead.

The API key is read from OPENAI_API_KEY. It may also be placed in a .env file
in the working directory or in ~/.config/git-daily-report/.env.";

/// Show git commits for the specified date (default is yesterday).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = Some(LONG_ABOUT), styles = STYLES)]
pub struct Cli {
    /// Date in YYYY-MM-DD format (e.g. 2025-05-14). Defaults to yesterday
    #[arg(long)]
    pub date: Option<String>,

    /// Path to the git repository
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// Author email for commits. Defaults to the configured git user.email
    #[arg(long)]
    pub email: Option<String>,

    /// Send the commits to the language model and print its report
    #[arg(long)]
    pub use_gpt: bool,

    /// Also look at remote-tracking branches
    #[arg(long)]
    pub remotes: bool,

    /// Branch to list first (e.g. develop)
    #[arg(long)]
    pub primary_branch: Option<String>,

    /// List each commit under the first branch containing it only
    #[arg(long)]
    pub exclusive: bool,

    /// How the repository is read
    #[arg(long, value_enum, default_value_t = BackendKind::Libgit)]
    pub backend: BackendKind,

    /// Output format for the commit list
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Output file to write the result to
    /// If not provided, prints to stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Use UTC day boundaries instead of the local time zone
    #[arg(long)]
    pub utc: bool,

    #[command(flatten)]
    pub remote: RemoteArgs,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

/// Options for the language model call.
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// Model used for the report
    /// Defaults to $GIT_DAILY_REPORT_MODEL, then gpt-4-turbo-preview
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    /// Defaults to $OPENAI_BASE_URL, then the OpenAI API
    #[arg(long)]
    pub api_base: Option<String>,

    /// Prompt template file; {{commits}}, {{date}} and {{author}} are substituted
    #[arg(long)]
    pub prompt_template: Option<PathBuf>,

    /// Print the prompt before the model's response
    #[arg(long)]
    pub show_prompt: bool,

    /// Give up on the API request after this long (e.g. 30s, 2m)
    #[arg(long, value_parser = humantime::parse_duration, default_value = "60s")]
    pub timeout: Duration,
}

/// Output format for the collected commits.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One section per branch, one line per commit
    Text,

    /// The grouped commits as JSON
    Json,
}

/// Version-control backends.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Read the repository in-process with libgit2
    Libgit,

    /// Run the git executable
    GitCli,
}
