// src/utils.rs
use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

const LINKEDIN_HOST: &str = "www.linkedin.com";

/// Trim a value and collapse blanks to `None`
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalize a profile identifier into the stable store key.
///
/// LinkedIn URLs become `https://www.linkedin.com/<path>` without query,
/// fragment or trailing slash. Anything else is an opaque id and is only trimmed.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.to_lowercase().contains("linkedin.com/") {
        return Some(trimmed.to_string());
    }

    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);
    let without_suffix = without_scheme
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(without_scheme);

    let path = without_suffix
        .split_once('/')
        .map(|(_, path)| path)
        .unwrap_or_default()
        .trim_end_matches('/');

    if path.is_empty() {
        return None;
    }

    Some(format!("https://{}/{}", LINKEDIN_HOST, path.to_lowercase()))
}

/// Public slug of a LinkedIn profile URL (`/in/<slug>`)
pub fn linkedin_slug(identifier: &str) -> Option<&str> {
    let (_, rest) = identifier.split_once("/in/")?;
    rest.split('/').next().filter(|slug| !slug.is_empty())
}

pub fn is_linkedin_url(identifier: &str) -> bool {
    identifier.starts_with("http://") || identifier.starts_with("https://")
}

/// Case-insensitive substring match against any non-blank keyword
pub fn contains_keyword(haystack: &str, keywords: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| haystack.contains(&k))
}

/// Case-insensitive exact match against any non-blank placeholder
pub fn matches_placeholder(value: &str, placeholders: &[String]) -> bool {
    let value = value.trim().to_lowercase();
    placeholders
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .any(|p| p == value)
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Validate file extension against allowed types
pub fn validate_file_extension(filename: &str, allowed: &[&str]) -> Result<()> {
    let ext = get_file_extension(filename)
        .ok_or_else(|| anyhow::anyhow!("File has no extension: {}", filename))?;

    if !allowed.contains(&ext.as_str()) {
        anyhow::bail!(
            "Unsupported file extension: {}. Allowed: {:?}",
            ext,
            allowed
        );
    }

    Ok(())
}

pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Delete a scratch file; failures are logged, never raised
pub async fn remove_temp_file(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to remove temporary file {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_linkedin_urls() {
        let expected = Some("https://www.linkedin.com/in/jane-doe".to_string());
        assert_eq!(normalize_identifier("https://www.linkedin.com/in/jane-doe/"), expected);
        assert_eq!(normalize_identifier("http://linkedin.com/in/Jane-Doe?trk=abc"), expected);
        assert_eq!(normalize_identifier("  www.linkedin.com/in/jane-doe#about "), expected);
    }

    #[test]
    fn test_opaque_ids_are_kept() {
        assert_eq!(normalize_identifier(" 42 "), Some("42".to_string()));
        assert_eq!(normalize_identifier("   "), None);
        assert_eq!(normalize_identifier("https://linkedin.com/"), None);
    }

    #[test]
    fn test_linkedin_slug() {
        assert_eq!(linkedin_slug("https://www.linkedin.com/in/jane-doe"), Some("jane-doe"));
        assert_eq!(linkedin_slug("42"), None);
    }

    #[test]
    fn test_keyword_matching_ignores_case_and_blanks() {
        let keywords = vec!["founder".to_string(), " ".to_string()];
        assert!(contains_keyword("Co-Founder & CEO", &keywords));
        assert!(!contains_keyword("Engineer", &keywords));
        assert!(!contains_keyword("anything", &[String::new()]));
    }

    #[test]
    fn test_placeholder_matching_is_exact() {
        let placeholders = vec!["Stealth".to_string()];
        assert!(matches_placeholder("  stealth ", &placeholders));
        assert!(!matches_placeholder("Stealth Labs", &placeholders));
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("profiles.CSV", &["csv"]).is_ok());
        assert!(validate_file_extension("profiles.txt", &["csv"]).is_err());
        assert!(validate_file_extension("noext", &["csv"]).is_err());
    }

    #[tokio::test]
    async fn test_remove_temp_file_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        tokio::fs::write(&path, "id,name\n").await.unwrap();

        assert!(remove_temp_file(&path).await);
        assert!(!path.exists());
        assert!(!remove_temp_file(&path).await);
    }
}
