//! Collision-resolving name sequence.
//!
//! Candidates follow the Windows convention: `report.pdf`,
//! `report (1).pdf`, `report (2).pdf`, … The sequence is bounded by the
//! caller; past the cap, [`timestamp_fallback`] guarantees termination.

use chrono::{DateTime, Utc};

use droplink_core::error::AppError;
use droplink_core::result::AppResult;

/// Suffix used by upload session reservation markers; a file name
/// carrying it would shadow a reservation.
const SESSION_MARKER_SUFFIX: &str = ".part";

/// Reject names that cannot serve as a single blob path segment.
///
/// Uploader-supplied names must never introduce path structure: a
/// separator would make the stored name and the blob path disagree,
/// and a `..` segment would walk out of the storage root.
pub fn validate_file_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("File name may not be empty"));
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return Err(AppError::validation(format!(
            "File name may not contain path separators: '{name}'"
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::validation(format!(
            "File name is not allowed: '{name}'"
        )));
    }
    if name.ends_with(SESSION_MARKER_SUFFIX) {
        return Err(AppError::validation(format!(
            "The '{SESSION_MARKER_SUFFIX}' suffix is reserved for upload sessions"
        )));
    }
    Ok(())
}

/// Split a file name into stem and extension. The extension keeps its
/// leading dot; names without one (or dotfiles like `.env`) have an
/// empty extension.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}

/// The `n`-th candidate for a contested name. `n = 0` is the name
/// itself.
pub fn numbered_candidate(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    let (stem, ext) = split_name(name);
    format!("{stem} ({n}){ext}")
}

/// Last-resort candidate once the numbered sequence is exhausted.
pub fn timestamp_fallback(name: &str, now: DateTime<Utc>) -> String {
    let (stem, ext) = split_name(name);
    format!("{stem} ({}){ext}", now.format("%Y%m%d%H%M%S%3f"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_sequence() {
        assert_eq!(numbered_candidate("report.pdf", 0), "report.pdf");
        assert_eq!(numbered_candidate("report.pdf", 1), "report (1).pdf");
        assert_eq!(numbered_candidate("report.pdf", 2), "report (2).pdf");
    }

    #[test]
    fn test_names_without_extension() {
        assert_eq!(numbered_candidate("README", 1), "README (1)");
        assert_eq!(numbered_candidate(".env", 1), ".env (1)");
    }

    #[test]
    fn test_multiple_dots_keep_last_extension() {
        assert_eq!(
            numbered_candidate("archive.tar.gz", 1),
            "archive.tar (1).gz"
        );
    }

    #[test]
    fn test_names_with_path_structure_rejected() {
        assert!(validate_file_name("../evil.txt").is_err());
        assert!(validate_file_name("a/b.txt").is_err());
        assert!(validate_file_name("a\\b.txt").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name(".").is_err());
        assert!(validate_file_name("  ").is_err());
        assert!(validate_file_name("upload.part").is_err());
    }

    #[test]
    fn test_plain_names_accepted() {
        assert!(validate_file_name("report.pdf").is_ok());
        assert!(validate_file_name("weird..name.txt").is_ok());
        assert!(validate_file_name(".env").is_ok());
        assert!(validate_file_name("partial.parts").is_ok());
    }

    #[test]
    fn test_timestamp_fallback_keeps_extension() {
        let now = Utc::now();
        let name = timestamp_fallback("report.pdf", now);
        assert!(name.starts_with("report ("));
        assert!(name.ends_with(").pdf"));
        assert_ne!(name, "report.pdf");
    }
}
