use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::AppResult;

/// Write the finished output to `output`, or to stdout when no file was given.
#[tracing::instrument(name = "Writing output", level = "debug", skip(data))]
pub async fn write_output(output: Option<&Path>, data: &[u8]) -> AppResult<()> {
    match output {
        Some(path) => write_file(path, data).await,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(data).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}

/// Write raw data to a file, creating parent directories and overwriting any existing content.
async fn write_file(path: &Path, data: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await?;
    info!("Wrote report to {}", path.display());
    Ok(())
}
