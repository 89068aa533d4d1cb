//! Fetch + decode of an audio asset.
//!
//! `http://` and `https://` URLs go through reqwest; anything else is read from
//! the local filesystem (an optional `file://` prefix is stripped). Decoding runs
//! on the blocking pool so the frame loop never waits on it.

use std::path::Path;

use super::decoder;
use super::types::AudioData;
use crate::error::{Error, Result};

/// Fetch raw bytes from `url` and decode them.
pub async fn fetch_and_decode(url: String) -> Result<AudioData> {
    log::info!("Loading audio from {url}");

    let bytes = fetch_bytes(&url).await?;
    let extension = extension_hint(&url);

    let decode_url = url.clone();
    let data = tokio::task::spawn_blocking(move || {
        decoder::decode_bytes(bytes, extension.as_deref())
    })
    .await
    .map_err(|e| Error::load_failure(&decode_url, format!("decode task failed: {e}")))?
    .map_err(|e| Error::load_failure(&decode_url, e))?;

    log::info!(
        "Loaded {url}: {:.2}s, {} ch @ {} Hz",
        data.duration,
        data.channels,
        data.sample_rate
    );
    Ok(data)
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    if is_remote(url) {
        let response = reqwest::get(url)
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::load_failure(url, e))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::load_failure(url, e))?;
        return Ok(bytes.to_vec());
    }

    let path = local_path(url).to_string();
    tokio::task::spawn_blocking(move || std::fs::read(path))
        .await
        .map_err(|e| Error::load_failure(url, format!("read task failed: {e}")))?
        .map_err(|e| Error::load_failure(url, e))
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn local_path(url: &str) -> &str {
    url.strip_prefix("file://").unwrap_or(url)
}

/// File extension used as a format hint, ignoring any query string or fragment.
fn extension_hint(url: &str) -> Option<String> {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    Path::new(trimmed)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
