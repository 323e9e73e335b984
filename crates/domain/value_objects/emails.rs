use anyhow::{Result, bail};

pub const MAX_EMAIL_LEN: usize = 254;

/// Lowercases and trims an address so lookups by email are exact matches.
pub fn normalize_email(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Invalid email: empty input");
    }
    if trimmed.len() > MAX_EMAIL_LEN {
        bail!("Invalid email: too long");
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        bail!("Invalid email: contains whitespace or control characters");
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        bail!("Invalid email: missing @");
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        bail!("Invalid email: malformed address");
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        bail!("Invalid email: malformed domain");
    }

    Ok(trimmed.to_lowercase())
}
