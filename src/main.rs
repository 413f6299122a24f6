pub(crate) mod ai;
mod app;
mod cli;
mod config;
mod emit;
mod error;
pub(crate) mod git;
mod io_utils;
mod logging;
pub(crate) mod serde_helpers;
pub(crate) mod time_utils;

pub(crate) use error::{AppError, AppResult};

use std::fmt::Display;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use time::UtcOffset;
use tracing::{Level, debug, error};

use crate::ai::OpenAiGenerator;
use crate::cli::{BackendKind, Cli};
use crate::config::Config;
use crate::git::{GitCli, LibGit};

fn main() -> ExitCode {
    // Must happen while the process still has a single thread.
    let local_offset = time_utils::local_offset();
    let env_files = config::load_env_files();
    let cli = Cli::parse();
    logging::setup_logger(cli.verbosity.tracing_level_filter());
    for path in &env_files {
        debug!("Loaded environment from {}", path.display());
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report_fatal(
                format_args!("Unable to start the async runtime: {e}"),
                tracing::enabled!(Level::ERROR),
                &mut std::io::stderr(),
            );
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli, local_offset)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_fatal(&e, tracing::enabled!(Level::ERROR), &mut std::io::stderr());
            ExitCode::FAILURE
        }
    }
}

/// Log a fatal error, or write it straight to `stderr` when `-q` has silenced
/// the error level.
fn report_fatal<W: Write>(e: impl Display, logged: bool, stderr: &mut W) {
    if logged {
        error!("{}", e);
    } else {
        let _ = writeln!(stderr, "Error: {e}");
    }
}

async fn run(cli: &Cli, local_offset: UtcOffset) -> AppResult<()> {
    let config = Config::resolve(cli, |key| std::env::var(key).ok(), local_offset)?;
    let generator = config
        .remote
        .as_ref()
        .map(OpenAiGenerator::new)
        .transpose()?;

    // Buffered so a failed remote call still leaves the local report to print.
    let mut buffer = Vec::new();
    let outcome = match config.backend {
        BackendKind::Libgit => {
            let backend = LibGit::open(&config.repo)?;
            app::generate_report(&config, &backend, generator.as_ref(), &mut buffer).await
        }
        BackendKind::GitCli => {
            let backend = GitCli::open(&config.repo).await?;
            app::generate_report(&config, &backend, generator.as_ref(), &mut buffer).await
        }
    };
    if !buffer.is_empty() {
        io_utils::write_output(config.output.as_deref(), &buffer).await?;
    }
    outcome
}
