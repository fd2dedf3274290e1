//! Folder identifier extraction for the command line.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{DriveError, Result};

/// Folder links as copied from the browser or the share dialog.
static FOLDER_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://drive\.google\.com/(?:drive/(?:u/\d+/)?(?:folders|mobile/folders)/|open\?(?:.*&)?id=)([a-zA-Z0-9_-]+)",
    )
    .expect("Invalid folder link regex")
});

/// Bare Drive id (alphanumeric, underscore, hyphen).
static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Extract the folder id from a Drive folder link, or accept a bare id.
///
/// Accepted forms:
/// - `https://drive.google.com/drive/folders/<ID>`
/// - `https://drive.google.com/drive/u/<N>/folders/<ID>`
/// - `https://drive.google.com/open?id=<ID>`
/// - `<ID>`
///
/// ```
/// use drive_mirror::url_parser::extract_folder_id;
///
/// let id = extract_folder_id("https://drive.google.com/drive/folders/1abc?usp=sharing").unwrap();
/// assert_eq!(id, "1abc");
/// ```
pub fn extract_folder_id(input: &str) -> Result<String> {
    let trimmed = input.trim();

    if let Some(id) = FOLDER_LINK_REGEX
        .captures(trimmed)
        .and_then(|c| c.get(1))
    {
        return Ok(id.as_str().to_string());
    }

    if ID_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(DriveError::InvalidUrlOrId(input.to_string()))
}
