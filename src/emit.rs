use std::io::Write;

use tracing::{info, warn};

use crate::AppResult;
use crate::ai::TextGenerator;
use crate::ai::prompt::PromptTemplate;
use crate::cli::OutputFormat;
use crate::git::Report;

/// Remote mode: the generator and how to build its prompt.
pub struct RemoteEmit<'a, G> {
    pub generator: &'a G,
    pub template: &'a PromptTemplate,
    pub show_prompt: bool,
}

/// Write `report` to `out`, or the generator's rewrite of it in Remote mode.
///
/// When the remote call fails the rendered report is written instead and the
/// error is still returned, so the caller can exit non-zero without losing the
/// local output.
pub async fn emit_report<G, W>(
    report: &Report,
    format: &OutputFormat,
    remote: Option<RemoteEmit<'_, G>>,
    out: &mut W,
) -> AppResult<()>
where
    G: TextGenerator,
    W: Write,
{
    let rendered = report.render(format)?;
    let Some(remote) = remote else {
        out.write_all(rendered.as_bytes())?;
        return Ok(());
    };
    if report.is_empty() {
        info!("Nothing to summarize, skipping the language model");
        out.write_all(rendered.as_bytes())?;
        return Ok(());
    }

    let prompt = remote.template.render_report(report);
    if remote.show_prompt {
        writeln!(out, "📤 Prompt:\n\n{}\n\n📥 Response:\n", prompt.trim_end())?;
    }
    match remote.generator.generate(&prompt).await {
        Ok(text) => {
            writeln!(out, "{}", text.trim_end())?;
            Ok(())
        }
        Err(e) => {
            warn!("No report from the language model, printing the commit list instead");
            out.write_all(rendered.as_bytes())?;
            Err(e)
        }
    }
}
