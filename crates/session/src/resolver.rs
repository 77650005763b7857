//! Source media lookup.

use std::path::Path;

use trimcrop_common::error::{TrimcropError, TrimcropResult};

/// Resolves a user-supplied media path for playback.
pub trait MediaResolver: Send + Sync {
    /// Whether the media exists.
    fn file_exists(&self, path: &str) -> bool;

    /// URL the preview surface can play.
    fn resolve_playable_url(&self, path: &str) -> TrimcropResult<String>;

    /// MIME type for the preview surface.
    fn mime_type(&self, path: &str) -> &'static str {
        mime_type_for(path)
    }
}

/// Resolver for local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMediaResolver;

impl MediaResolver for FsMediaResolver {
    fn file_exists(&self, path: &str) -> bool {
        Path::new(&normalize_media_path(path)).is_file()
    }

    fn resolve_playable_url(&self, path: &str) -> TrimcropResult<String> {
        let normalized = normalize_media_path(path);
        if normalized.trim().is_empty() {
            return Err(TrimcropError::load_failure("empty media path"));
        }
        let encoded = encode_path(&normalized);
        if encoded.starts_with('/') {
            Ok(format!("file://{encoded}"))
        } else {
            Ok(format!("file:///{encoded}"))
        }
    }
}

/// Strip a `file://` prefix and use forward slashes.
pub fn normalize_media_path(path: &str) -> String {
    let stripped = path.strip_prefix("file://").unwrap_or(path);
    stripped.replace('\\', "/")
}

fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '%' => out.push_str("%25"),
            _ => out.push(ch),
        }
    }
    out
}

/// MIME type by file extension; unknown extensions are treated as MP4.
pub fn mime_type_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "avi" => "video/avi",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => "video/mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_scheme_and_backslashes() {
        assert_eq!(normalize_media_path("file:///home/me/a.mp4"), "/home/me/a.mp4");
        assert_eq!(normalize_media_path(r"C:\Videos\a.mp4"), "C:/Videos/a.mp4");
    }

    #[test]
    fn test_playable_url_is_encoded() {
        let url = FsMediaResolver
            .resolve_playable_url("/home/me/my clip #1.mp4")
            .unwrap();
        assert_eq!(url, "file:///home/me/my%20clip%20%231.mp4");

        let url = FsMediaResolver.resolve_playable_url(r"C:\V\a.mp4").unwrap();
        assert_eq!(url, "file:///C:/V/a.mp4");
        assert!(FsMediaResolver.resolve_playable_url("").is_err());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for("a.MOV"), "video/quicktime");
        assert_eq!(mime_type_for("a.mkv"), "video/x-matroska");
        assert_eq!(mime_type_for("a.webm"), "video/webm");
        assert_eq!(mime_type_for("a.avi"), "video/avi");
        assert_eq!(mime_type_for("noext"), "video/mp4");
    }

    #[test]
    fn test_missing_file() {
        assert!(!FsMediaResolver.file_exists("/nonexistent/trimcrop/clip.mp4"));
    }
}
