//! Input validation utilities

use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

/// Longest accepted source URL, matching the `qr_codes.source_url` column
pub const MAX_URL_LENGTH: usize = 2083;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 80;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < MIN_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at least {} characters long",
            MIN_USERNAME_LENGTH
        ));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at most {} characters long",
            MAX_USERNAME_LENGTH
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    if password.chars().any(char::is_control) {
        return Err("Password contains invalid characters".to_string());
    }

    Ok(())
}

/// Validate a URL submitted for QR generation, returning it trimmed
pub fn validate_source_url(raw: &str) -> Result<String, String> {
    let url = raw.trim();

    if url.is_empty() {
        return Err("Please enter a URL".to_string());
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(format!(
            "URL must be at most {} characters long",
            MAX_URL_LENGTH
        ));
    }

    let parsed = Url::parse(url).map_err(|_| "Please enter a valid URL".to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err("URL must start with http:// or https://".to_string());
    }

    Ok(url.to_string())
}
