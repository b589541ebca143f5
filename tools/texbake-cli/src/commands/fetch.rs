//! Fetch one file from the remote mount.

use std::path::PathBuf;

use serde_json::json;

use texbake_common::config::ServiceConfig;
use texbake_remote_fetch::{FetchOutcome, FetchService, CACHE_CONTROL};

pub async fn run(
    config: &ServiceConfig,
    remote_path: String,
    output: Option<PathBuf>,
) -> anyhow::Result<bool> {
    config.validate()?;
    let service = FetchService::from_config(&config.remote)?;

    let report = match service.fetch(remote_path).await {
        FetchOutcome::Fetched(file) => {
            if let Some(path) = &output {
                std::fs::write(path, &file.bytes)?;
            }
            json!({
                "success": true,
                "remote_path": file.handle.remote_path,
                "content_type": file.handle.content_type,
                "cache_control": CACHE_CONTROL,
                "size_bytes": file.bytes.len(),
                "written_to": output.as_ref().map(|p| p.display().to_string()),
            })
        }
        FetchOutcome::Rejected(err) | FetchOutcome::Failed(err) => json!({
            "success": false,
            "client_error": err.is_client_error(),
            "error_kind": err.kind(),
            "message": err.to_string(),
        }),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report["success"] == true)
}
