//! Newline-delimited job loop.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use reelhook_models::Job;

use crate::adapter::JobAdapter;
use crate::error::WorkerResult;
use crate::handler::{error_result, CallbackHandler};

/// Read one job JSON per line, handle each in turn and write one result JSON
/// per line. Blank lines are ignored; unparseable lines produce an error
/// result. Returns the number of results written.
pub async fn run_jobs<A, R, W>(
    handler: &CallbackHandler<A>,
    reader: R,
    mut writer: W,
) -> WorkerResult<usize>
where
    A: JobAdapter,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut processed = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match serde_json::from_str::<Job>(line) {
            Ok(job) => handler.handle(&job).await,
            Err(e) => {
                warn!(error = %e, "Skipping unparseable job line");
                error_result(&format!("invalid job: {}", e))
            }
        };

        let mut out = serde_json::to_vec(&result)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
        processed += 1;
    }

    info!(processed, "Job input exhausted");
    Ok(processed)
}
