use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to the list of messages the backend attached to it.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("session expired")]
    SessionExpired,
    #[error("validation failed: {}", summarize(.0))]
    Validation(ValidationErrors),
    #[error("server rejected request ({status}): {message}")]
    Status { status: StatusCode, message: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

fn summarize(errors: &ValidationErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Maps a non-success response body onto the error taxonomy.
///
/// The backend answers failures either with a flat `{field: [messages]}`
/// validation map or with a generic `{error}` / `{message}` / `{detail}`
/// object; anything else is surfaced as raw text.
pub(crate) fn classify_failure(status: StatusCode, body: &[u8]) -> ApiError {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(object) = value.as_object() {
            for key in ["error", "message", "detail"] {
                if let Some(text) = object.get(key).and_then(Value::as_str) {
                    return ApiError::Status {
                        status,
                        message: text.to_string(),
                    };
                }
            }

            let mut fields = ValidationErrors::new();
            for (name, messages) in object {
                if let Some(list) = messages.as_array() {
                    let texts: Vec<String> = list
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect();
                    if !texts.is_empty() {
                        fields.insert(name.clone(), texts);
                    }
                }
            }
            if !fields.is_empty() && status.is_client_error() {
                return ApiError::Validation(fields);
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    let message = if trimmed.is_empty() {
        "unknown error".to_string()
    } else {
        trimmed.to_string()
    };
    ApiError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_map_becomes_validation_error() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            br#"{"name": ["obligatoire"], "unit": ["choix invalide"]}"#,
        );
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields["name"], vec!["obligatoire".to_string()]);
                assert_eq!(fields["unit"], vec!["choix invalide".to_string()]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn generic_body_becomes_status_error() {
        let err = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"error": "boom"}"#,
        );
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(message, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn field_map_on_a_server_failure_is_not_validation() {
        let err = classify_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"name": ["obligatoire"]}"#,
        );
        assert!(matches!(err, ApiError::Status { .. }));
    }

    #[test]
    fn unparseable_body_falls_back_to_raw_text() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, b"upstream timed out");
        match err {
            ApiError::Status { message, .. } => assert_eq!(message, "upstream timed out"),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_reports_unknown_error() {
        let err = classify_failure(StatusCode::NOT_FOUND, b"");
        match err {
            ApiError::Status { message, .. } => assert_eq!(message, "unknown error"),
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
