// ABOUTME: Custom error types for the database console
// ABOUTME: Provides context-specific error variants and display-message normalization

use std::fmt;

#[derive(Debug)]
pub enum ConsoleError {
    Connection(String),
    Api { status: u16, message: Option<String> },
    Validation(String),
    Config(String),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConsoleError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ConsoleError::Api {
                status,
                message: Some(msg),
            } => write!(f, "API error ({}): {}", status, msg),
            ConsoleError::Api {
                status,
                message: None,
            } => write!(f, "API error ({})", status),
            ConsoleError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ConsoleError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ConsoleError {}

/// Extracts the human-readable message from an error response body.
///
/// The service reports failures as `{"error": "..."}`, `{"detail": "..."}` or
/// as per-field lists such as `{"name": ["..."]}`; the first one found wins.
pub fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    for key in ["error", "detail", "message"] {
        if let Some(msg) = object.get(key).and_then(|v| v.as_str()) {
            if !msg.trim().is_empty() {
                return Some(msg.to_string());
            }
        }
    }

    object.values().find_map(|v| {
        v.as_array()
            .and_then(|items| items.first())
            .and_then(|first| first.as_str())
            .map(str::to_string)
    })
}

/// Normalizes a submission failure into the string shown to the user.
pub fn display_message(err: &anyhow::Error, fallback: &str) -> String {
    match err.downcast_ref::<ConsoleError>() {
        Some(ConsoleError::Api {
            message: Some(msg), ..
        }) => msg.clone(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_error_field() {
        let body = r#"{"detail": "Not found.", "error": "Target database not found or access denied."}"#;
        assert_eq!(
            server_message(body).as_deref(),
            Some("Target database not found or access denied.")
        );
    }

    #[test]
    fn test_server_message_reads_field_errors() {
        let body = r#"{"name": ["A database with this name already exists."]}"#;
        assert_eq!(
            server_message(body).as_deref(),
            Some("A database with this name already exists.")
        );
    }

    #[test]
    fn test_server_message_ignores_non_json() {
        assert_eq!(server_message("<html>Bad Gateway</html>"), None);
        assert_eq!(server_message(r#"{"error": "  "}"#), None);
    }

    #[test]
    fn test_display_message_falls_back() {
        let api = anyhow::Error::new(ConsoleError::Api {
            status: 400,
            message: Some("Source database must be running to start a migration.".into()),
        });
        assert_eq!(
            display_message(&api, "Migration failed. Please try again."),
            "Source database must be running to start a migration."
        );

        let bare = anyhow::Error::new(ConsoleError::Api {
            status: 502,
            message: None,
        });
        assert_eq!(
            display_message(&bare, "Migration failed. Please try again."),
            "Migration failed. Please try again."
        );

        let transport = anyhow::anyhow!("connection refused");
        assert_eq!(display_message(&transport, "fallback"), "fallback");
    }
}
