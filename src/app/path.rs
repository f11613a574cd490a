//! Filesystem-safe path segments
//!
//! Scraped titles and publisher names become directory and file names, so
//! every character the host filesystem rejects in a path segment is stripped.

use std::path::{Path, PathBuf};

use crate::constants::files;

/// Characters that may not appear in a file name on this platform
#[cfg(windows)]
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Characters that may not appear in a file name on this platform
#[cfg(not(windows))]
const INVALID_CHARS: &[char] = &['/', '\0'];

/// Whether `c` is illegal inside a single path segment
pub fn is_invalid_char(c: char) -> bool {
    if cfg!(windows) && c.is_ascii_control() && (c as u32) < 0x20 {
        return true;
    }
    INVALID_CHARS.contains(&c)
}

/// Remove every character that is illegal in a path segment
///
/// Removal never introduces new characters, so the result is stable under a
/// second application.
pub fn sanitize_segment(text: &str) -> String {
    text.chars().filter(|&c| !is_invalid_char(c)).collect()
}

/// Whether a sanitized segment can be used as a directory name
pub fn is_usable_segment(segment: &str) -> bool {
    !segment.trim().is_empty() && segment != "." && segment != ".."
}

/// Sibling of `path` used while its content is being written: `{path}.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(files::TEMP_FILE_SUFFIX);
    path.with_file_name(file_name)
}
