//! Request validation at the HTTP boundary.

use crate::error::{Error, Result};
use url::Url;

/// Validate a user-supplied URL and return it in normalized form.
///
/// A missing scheme is assumed to be `https`. The host must equal one of
/// `allowed_hosts` or be a subdomain of one.
pub(crate) fn validate_url(raw: &str, allowed_hosts: &[String]) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("URL is required".to_string()));
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{trimmed}"))
            .map_err(|_| Error::Validation(format!("invalid URL: {trimmed}")))?,
        Err(_) => return Err(Error::Validation(format!("invalid URL: {trimmed}"))),
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Validation(format!(
            "unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .ok_or_else(|| Error::Validation(format!("URL has no host: {trimmed}")))?;

    if !host_allowed(&host, allowed_hosts) {
        return Err(Error::Validation(format!(
            "unsupported host '{host}', expected one of: {}",
            allowed_hosts.join(", ")
        )));
    }

    Ok(parsed.into())
}

fn host_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    allowed_hosts.iter().any(|allowed| {
        let allowed = allowed.trim().trim_end_matches('.').to_ascii_lowercase();
        !allowed.is_empty()
            && (host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.')))
    })
}

/// Parse a requested video height; empty means `default`.
pub(crate) fn parse_quality(raw: &str, default: u32) -> Result<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    let digits = trimmed.strip_suffix(['p', 'P']).unwrap_or(trimmed);
    match digits.parse::<u32>() {
        Ok(height) if height > 0 => Ok(height),
        _ => Err(Error::Validation(format!(
            "invalid quality '{trimmed}', expected a positive height such as 1080"
        ))),
    }
}
