//! Slug generation and validation.

use rand::Rng;

use droplink_core::error::AppError;
use droplink_core::result::AppResult;

const SLUG_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const RANDOM_SLUG_LEN: usize = 10;
const MAX_SLUG_LEN: usize = 64;

/// Generate a random lowercase alphanumeric slug.
pub fn random_slug() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_SLUG_LEN)
        .map(|_| SLUG_CHARS[rng.gen_range(0..SLUG_CHARS.len())] as char)
        .collect()
}

/// Validate a caller-chosen slug: lowercase alphanumerics and hyphens,
/// no leading/trailing hyphen, bounded length.
pub fn validate_slug(slug: &str) -> AppResult<()> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return Err(AppError::validation(format!(
            "Slug must be 1-{MAX_SLUG_LEN} characters"
        )));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(AppError::validation("Slug may not start or end with '-'"));
    }
    if !slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(AppError::validation(
            "Slug may only contain lowercase letters, digits, and '-'",
        ));
    }
    Ok(())
}

/// Derive a slug from a folder name, with a random suffix to keep
/// collisions rare. `"Q3 Reports"` becomes `"q3-reports-x7k2p9"`.
pub fn slug_from_name(name: &str) -> String {
    let mut base: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    while base.contains("--") {
        base = base.replace("--", "-");
    }
    let base = base.trim_matches('-');
    let base = if base.is_empty() { "folder" } else { base };
    let base: String = base.chars().take(MAX_SLUG_LEN - 8).collect();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| SLUG_CHARS[rng.gen_range(0..SLUG_CHARS.len())] as char)
        .collect();
    format!("{}-{suffix}", base.trim_matches('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_slug_is_valid() {
        for _ in 0..20 {
            validate_slug(&random_slug()).unwrap();
        }
    }

    #[test]
    fn test_validate_rejects_bad_slugs() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("Upper").is_err());
        assert!(validate_slug("with space").is_err());
        assert!(validate_slug(&"a".repeat(65)).is_err());

        validate_slug("q3-reports").unwrap();
        validate_slug("abc123").unwrap();
    }

    #[test]
    fn test_slug_from_name() {
        let slug = slug_from_name("Q3 Reports");
        assert!(slug.starts_with("q3-reports-"));
        validate_slug(&slug).unwrap();

        let slug = slug_from_name("///");
        assert!(slug.starts_with("folder-"));
        validate_slug(&slug).unwrap();
    }
}
