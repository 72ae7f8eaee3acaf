use reelhook_media::check_tool;
use reelhook_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!("worker-selfcheck: starting");
    ensure_handler(config.handler_cmd.as_deref())?;

    if config.transcode.enabled {
        let path = check_tool(&config.transcode.program)
            .await
            .map_err(|e| anyhow::anyhow!("transcoder not usable: {}", e))?;
        println!("worker-selfcheck: transcoder at {}", path.display());
    } else {
        println!("worker-selfcheck: transcoding disabled, skipping ffmpeg check");
    }

    if config.delivery.fallback_url.is_none() {
        println!("worker-selfcheck: no WEBHOOK_URL set, jobs must carry their own webhook_url");
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

fn ensure_handler(cmd: Option<&str>) -> anyhow::Result<()> {
    let cmd = cmd.ok_or_else(|| anyhow::anyhow!("missing required env var JOB_HANDLER_CMD"))?;
    let program = cmd
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow::anyhow!("JOB_HANDLER_CMD is empty"))?;

    which::which(program).map_err(|e| anyhow::anyhow!("handler {} not found: {}", program, e))?;
    Ok(())
}
