//! Filename resolution and sanitization for transfer destinations.
//!
//! Resume correctness depends on a *stable* destination path: re-submitting
//! the same request must land on the same file so the planner can compare
//! its size against the remote total. There is therefore no duplicate-suffix
//! logic here; the resolved name is deterministic for a given request and
//! response metadata.

use std::path::{Component, Path};

use url::Url;

/// Resolves the destination filename for a transfer.
///
/// Precedence:
/// 1. explicit filename from the request (sanitized)
/// 2. `Content-Disposition` filename reported by the probe
/// 3. last URL path segment
/// 4. `download_<timestamp><ext>` with the extension guessed from Content-Type
pub(crate) fn resolve_filename(
    explicit: Option<&str>,
    suggested: Option<&str>,
    url: &Url,
    content_type: Option<&str>,
) -> String {
    if let Some(name) = explicit.map(sanitize_filename).filter(|n| !is_blank(n)) {
        return name;
    }
    if let Some(name) = suggested.map(sanitize_filename).filter(|n| !is_blank(n)) {
        return name;
    }
    if let Some(mut segments) = url.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        let decoded = urlencoding::decode(last)
            .map(std::borrow::Cow::into_owned)
            .unwrap_or_else(|_| last.to_string());
        let name = sanitize_filename(&decoded);
        if !is_blank(&name) {
            return name;
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let extension = content_type.map_or(".bin", extension_from_content_type);
    format!("download_{timestamp}{extension}")
}

fn is_blank(name: &str) -> bool {
    name.trim_matches('_').is_empty()
}

/// Parses a Content-Disposition header to extract the attachment filename.
///
/// Handles:
/// - `attachment; filename="example.iso"`
/// - `attachment; filename=example.iso`
/// - `attachment; filename*=UTF-8''example.iso` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    // filename*= first (RFC 5987 encoded form wins over the plain one)
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded_name = encoded[..end].trim();
            if let Ok(decoded) = urlencoding::decode(encoded_name) {
                return Some(decoded.into_owned());
            }
        }
    }

    if let Some(pos) = header.find("filename=") {
        let value = header[pos + 9..].trim();
        if let Some(stripped) = value.strip_prefix('"') {
            if let Some(end) = stripped.find('"') {
                return Some(stripped[..end].to_string());
            }
        } else {
            let end = value.find(';').unwrap_or(value.len());
            let filename = value[..end].trim();
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        }
    }

    None
}

/// Sanitizes a filename for filesystem safety.
///
/// Replaces path separators, reserved characters, and control characters.
/// Dot-only segments (`.`, `..`) are rewritten so the result can never
/// escape the destination directory.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Guess file extension from a Content-Type header value.
pub(crate) fn extension_from_content_type(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    match mime.as_str() {
        "text/html" => ".html",
        "text/plain" => ".txt",
        "application/json" => ".json",
        "application/xml" | "text/xml" => ".xml",
        "application/pdf" => ".pdf",
        "application/zip" => ".zip",
        "application/gzip" => ".gz",
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "video/mp4" => ".mp4",
        "audio/mpeg" => ".mp3",
        _ => ".bin",
    }
}
