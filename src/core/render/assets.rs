//! Inlining of tile icons and banners as `data:` URIs.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BoardError, Result};

/// Timeout for fetching a remote asset.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Largest asset that will be embedded (5 MiB).
pub const MAX_ASSET_BYTES: usize = 5 * 1024 * 1024;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Resolve an icon or banner reference into a data URI.
///
/// `http://` and `https://` references are downloaded; anything else is a
/// file path, relative paths being resolved against `base_dir`.
pub async fn resolve(reference: &str, base_dir: &Path, client: &reqwest::Client) -> Result<String> {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        fetch(reference, client).await
    } else {
        read_file(&resolve_path(reference, base_dir)).await
    }
}

fn resolve_path(reference: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

async fn fetch(url: &str, client: &reqwest::Client) -> Result<String> {
    let mut response = client
        .get(url)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| BoardError::asset(format!("fetching {}: {}", url, e)))?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(BoardError::asset(format!(
            "fetching {}: status {}",
            url,
            response.status().as_u16()
        )));
    }

    let header_mime = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(clean_mime);

    let mut data = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| BoardError::asset(format!("reading response from {}: {}", url, e)))?
    {
        if data.len() + chunk.len() > MAX_ASSET_BYTES {
            return Err(BoardError::asset(format!(
                "{} is larger than {} bytes",
                url, MAX_ASSET_BYTES
            )));
        }
        data.extend_from_slice(&chunk);
    }

    let mime = header_mime.unwrap_or_else(|| sniff_mime(&data).to_string());
    Ok(data_uri(&mime, &data))
}

async fn read_file(path: &Path) -> Result<String> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| BoardError::asset(format!("reading file {}: {}", path.display(), e)))?;
    if data.len() > MAX_ASSET_BYTES {
        return Err(BoardError::asset(format!(
            "{} is larger than {} bytes",
            path.display(),
            MAX_ASSET_BYTES
        )));
    }

    let mime = mime_for_path(path).unwrap_or_else(|| sniff_mime(&data));
    Ok(data_uri(mime, &data))
}

pub fn data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// MIME type for common image extensions.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

/// Guess a MIME type from magic bytes.
fn sniff_mime(data: &[u8]) -> &'static str {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        "image/gif"
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        "image/webp"
    } else if data.starts_with(&[0, 0, 1, 0]) {
        "image/x-icon"
    } else if looks_like_svg(data) {
        "image/svg+xml"
    } else {
        FALLBACK_MIME
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    String::from_utf8_lossy(head).contains("<svg")
}

/// Keep only the `type/subtype` part of a Content-Type header, and only if it
/// is made of token characters, since it ends up verbatim in the page.
fn clean_mime(header: &str) -> Option<String> {
    let essence = header.split(';').next()?.trim();
    let valid = essence.split_once('/').is_some_and(|(kind, sub)| {
        !kind.is_empty()
            && !sub.is_empty()
            && essence
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '+' | '-'))
    });
    valid.then(|| essence.to_ascii_lowercase())
}
