use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use url::Url;

const ARCHIVE_EXTENSIONS: [&str; 8] = ["zip", "cbz", "rar", "cbr", "7z", "cb7", "tar", "tgz"];

const FALLBACK_ARCHIVE_NAME: &str = "Archive";

/// Derives the stable archive id for a url. For `file://` urls the id is the
/// second-to-last path segment, which in the library layout is the archive's
/// content-addressed directory name. Anything else hashes the url itself.
pub fn archive_id_from_url(raw_url: &str) -> String {
    if let Ok(parsed) = Url::parse(raw_url) {
        if parsed.scheme() == "file" {
            if let Some(segments) = parsed.path_segments() {
                let parts: Vec<&str> = segments.filter(|part| !part.is_empty()).collect();
                if parts.len() >= 2 {
                    return decode_segment(parts[parts.len() - 2]);
                }
            }
        }
    }
    hash_url(raw_url)
}

fn hash_url(raw_url: &str) -> String {
    let digest = Sha256::digest(raw_url.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Resolves the filename shown for a url: the `f` query parameter when
/// present, else the last path segment, else a literal fallback.
pub fn display_filename_from_url(raw_url: &str) -> String {
    let Ok(parsed) = Url::parse(raw_url) else {
        return FALLBACK_ARCHIVE_NAME.to_string();
    };

    if let Some((_, value)) = parsed.query_pairs().find(|(key, _)| key == "f") {
        let value = value.trim();
        if !value.is_empty() {
            return value.to_string();
        }
    }

    if let Some(segments) = parsed.path_segments() {
        if let Some(last) = segments.filter(|part| !part.is_empty()).last() {
            return decode_segment(last);
        }
    }

    FALLBACK_ARCHIVE_NAME.to_string()
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

pub fn is_archive_filename(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ARCHIVE_EXTENSIONS
        .iter()
        .any(|extension| lower.ends_with(&format!(".{extension}")))
}

/// Filesystem path for a `file://` url, `None` for any other scheme.
pub fn local_library_path(raw_url: &str) -> Option<PathBuf> {
    let parsed = Url::parse(raw_url).ok()?;
    if parsed.scheme() != "file" {
        return None;
    }
    parsed.to_file_path().ok()
}
