//! Utility functions for filename resolution, path selection and display formatting

use crate::config::FileCollisionAction;
use crate::error::{Error, Result};
use crate::types::{ItemId, OutputFormat};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Per-component filename limit of common filesystems, in bytes
pub const MAX_COMPONENT_BYTES: usize = 255;

/// Byte cap for resolved filenames, leaving room for a ` (9999)` rename suffix
/// and the hidden `.<name>.part` staging file
pub const MAX_FILENAME_BYTES: usize = 240;

/// Longest suffix still treated as an extension when shortening a name
const MAX_EXTENSION_BYTES: usize = 16;

/// Characters that cannot appear in a saved filename
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Resolve the filename an item is saved under
///
/// Prefers the filename carried by a `Content-Disposition` header, percent-decoded
/// when possible. Without a usable header value the name is synthesised as
/// `video-<id>.<ext>`.
///
/// # Examples
///
/// ```
/// use playlist_dl::types::{ItemId, OutputFormat};
/// use playlist_dl::utils::resolve_filename;
///
/// let header = r#"attachment; filename="My%20Song.mp3""#;
/// let id = ItemId::from("abc");
/// assert_eq!(resolve_filename(Some(header), &id, OutputFormat::Audio), "My Song.mp3");
/// assert_eq!(resolve_filename(None, &id, OutputFormat::Audio), "video-abc.mp3");
/// ```
pub fn resolve_filename(
    content_disposition: Option<&str>,
    id: &ItemId,
    format: OutputFormat,
) -> String {
    content_disposition
        .and_then(filename_from_content_disposition)
        .and_then(|name| sanitize_filename(&name))
        .unwrap_or_else(|| fallback_filename(id, format))
}

/// Synthesised filename used when the response carries none
pub fn fallback_filename(id: &ItemId, format: OutputFormat) -> String {
    let name = format!("video-{}.{}", id, format.extension());
    sanitize_filename(&name).unwrap_or_else(|| format!("video.{}", format.extension()))
}

/// Extract a filename from a `Content-Disposition` header value
///
/// Handles both forms:
/// - `filename="file.mp3"` or bare `filename=file.mp3`
/// - RFC 5987 `filename*=UTF-8''file%20name.mp3` (preferred when present)
///
/// The value is percent-decoded; if decoding fails the raw value is kept.
pub fn filename_from_content_disposition(value: &str) -> Option<String> {
    let extended = Regex::new(r#"(?i)filename\*\s*=\s*([^;]+)"#).ok()?;
    if let Some(caps) = extended.captures(value) {
        let raw = caps[1].trim().trim_matches('"');
        // charset'lang'encoded-filename; the value itself may contain quotes
        let mut parts = raw.splitn(3, '\'');
        let encoded = match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(_), Some(value)) => value,
            _ => raw,
        };
        if !encoded.is_empty() {
            return Some(percent_decode_or_raw(encoded));
        }
    }

    let plain = Regex::new(r#"(?i)filename\s*=\s*(?:"([^"]*)"|([^;]+))"#).ok()?;
    let caps = plain.captures(value)?;
    let raw = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim())?;
    if raw.is_empty() {
        return None;
    }
    Some(percent_decode_or_raw(raw))
}

fn percent_decode_or_raw(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::debug!(filename = raw, error = %e, "filename is not valid percent-encoded UTF-8, keeping raw value");
            raw.to_string()
        }
    }
}

/// Make a header-supplied name safe to use as a single path component
///
/// Reserved characters and control characters become `_`, surrounding whitespace
/// and dots are trimmed, and the result is shortened to [`MAX_FILENAME_BYTES`]
/// keeping its extension. Returns `None` if nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        return None;
    }
    Some(truncate_filename(trimmed, MAX_FILENAME_BYTES))
}

/// Shorten `name` to at most `max_bytes` bytes, cutting the stem on a char boundary
///
/// A short extension (`.mp3`) is kept. Names already within the limit are returned as-is.
///
/// ```
/// use playlist_dl::utils::truncate_filename;
///
/// assert_eq!(truncate_filename("abcdef.mp3", 8), "abcd.mp3");
/// assert_eq!(truncate_filename("音音音.mp3", 10), "音音.mp3");
/// ```
pub fn truncate_filename(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(idx) => {
            let ext_len = name.len() - idx;
            if idx > 0 && ext_len <= MAX_EXTENSION_BYTES && ext_len < max_bytes {
                name.split_at(idx)
            } else {
                (name, "")
            }
        }
        None => (name, ""),
    };

    let mut end = max_bytes - extension.len();
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    let stem = stem[..end].trim_end_matches([' ', '.']);
    format!("{stem}{extension}")
}

/// Get a unique path for a file, handling collisions according to the specified action
///
/// # Arguments
///
/// * `path` - The desired file path
/// * `action` - How to handle file collisions
///
/// # Returns
///
/// Returns the final path to use. For Rename action, this may have a suffix added.
/// For Skip action, returns an error if the file already exists.
/// For Overwrite action, returns the original path unchanged.
///
/// # Examples
///
/// ```
/// use playlist_dl::utils::get_unique_path;
/// use playlist_dl::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/song.mp3");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If /tmp/song.mp3 exists, returns /tmp/song (1).mp3
/// // If that exists too, returns /tmp/song (2).mp3, etc.
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(Error::FileCollision {
                    path: path.to_path_buf(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| Error::Other(format!("cannot extract file stem from {}", path.display())))?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().unwrap_or_else(|| Path::new(""));

            // Try adding (1), (2), (3), ... until we find a unique name
            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(Error::FileCollision {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Format a total duration for the selection summary
///
/// ```
/// use playlist_dl::utils::format_total_duration;
///
/// assert_eq!(format_total_duration(0), "0s");
/// assert_eq!(format_total_duration(125), "2m 5s");
/// assert_eq!(format_total_duration(3723), "1h 2m 3s");
/// ```
pub fn format_total_duration(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}

/// Format an item duration as a clock badge (`m:ss` or `h:mm:ss`)
pub fn format_clock(seconds: u64) -> String {
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
