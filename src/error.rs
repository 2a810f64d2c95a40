use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid api base url: {0}")]
    InvalidBase(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid response json: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("invalid due date `{0}`, expected YYYY-MM-DD")]
    InvalidDueDate(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timeout `{0}`, expected whole seconds")]
    InvalidTimeout(String),
}

/// Anything a user action can fail with, as shown in the view.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Form(#[from] FormError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_readable() {
        let err = ApiError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: r#"{"error":"title is required"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"http 400 Bad Request: {"error":"title is required"}"#
        );

        let err = ClientError::from(FormError::InvalidDueDate("tomorrow".to_string()));
        assert_eq!(
            err.to_string(),
            "invalid due date `tomorrow`, expected YYYY-MM-DD"
        );
    }
}
