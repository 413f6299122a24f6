use std::io::Write;

use tracing::info;

use crate::AppResult;
use crate::ai::TextGenerator;
use crate::config::Config;
use crate::emit::{RemoteEmit, emit_report};
use crate::git::{Report, VcsBackend, collect_commits, resolve_author};

/// Collect the day's commits through `backend` and emit them to `out`.
///
/// `generator` is only consulted when `config.remote` is set.
#[tracing::instrument(name = "Generating daily report", level = "debug", skip_all)]
pub async fn generate_report<B, G, W>(
    config: &Config,
    backend: &B,
    generator: Option<&G>,
    out: &mut W,
) -> AppResult<()>
where
    B: VcsBackend,
    G: TextGenerator,
    W: Write,
{
    let author = resolve_author(backend, config.email.as_deref()).await?;
    let branches = collect_commits(backend, &author, &config.window(), &config.collect).await?;
    let report = Report::new(config.date, author, branches);
    if report.is_empty() {
        info!("No commits by {} on {}", report.author, report.date);
    }

    let remote = match (&config.remote, generator) {
        (Some(settings), Some(generator)) => Some(RemoteEmit {
            generator,
            template: &settings.template,
            show_prompt: settings.show_prompt,
        }),
        _ => None,
    };
    emit_report(&report, &config.format, remote, out).await
}
