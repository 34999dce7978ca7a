//! Classification of forge HTTP failures into user-facing messages.

use reqwest::StatusCode;

use crate::error::PackError;

/// Describe a failed status in terms the user can act on.
pub fn describe_status(status: StatusCode, body_hint: &str) -> String {
    match status {
        StatusCode::UNAUTHORIZED => {
            "Authentication failed. Check your GITHUB_TOKEN.".to_string()
        }
        StatusCode::FORBIDDEN if body_hint.contains("rate limit") => {
            "API rate limit exceeded. Try again later or set GITHUB_TOKEN environment variable."
                .to_string()
        }
        StatusCode::FORBIDDEN => {
            "Access to this resource is forbidden. You may need authentication.".to_string()
        }
        StatusCode::TOO_MANY_REQUESTS => "Too many requests. Try again later.".to_string(),
        StatusCode::NOT_FOUND => "The requested repository was not found".to_string(),
        s if s.is_client_error() => format!("HTTP {} error", s.as_u16()),
        s => format!("Server error (HTTP {})", s.as_u16()),
    }
}

/// Map a reqwest error to `PackError::ForgeUnavailable`.
pub fn classify_error(error: reqwest::Error) -> anyhow::Error {
    let message = match error.status() {
        Some(status) => describe_status(status, &error.to_string()),
        None if error.is_decode() => format!("Unexpected response from forge: {}", error),
        None => format!("Failed to reach forge: {}", error),
    };
    anyhow::Error::from(PackError::ForgeUnavailable(message))
}
