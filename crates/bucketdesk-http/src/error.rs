//! HTTP-layer error types.

/// A request path or method the console does not serve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// No route matches the path.
    #[error("no route for {0}")]
    NotFound(String),

    /// The path exists but not for this method.
    #[error("method not allowed; allowed: {allow}")]
    MethodNotAllowed {
        /// Value for the `Allow` response header.
        allow: &'static str,
    },
}

/// A request body that could not be turned into a console action.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// The body could not be read from the connection.
    #[error("failed to read request body: {0}")]
    ReadBody(String),

    /// The multipart upload body is malformed.
    #[error("invalid multipart body: {0}")]
    InvalidMultipart(String),
}

impl HttpError {
    /// Status code reported to the client.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::BodyTooLarge { .. } => http::StatusCode::PAYLOAD_TOO_LARGE,
            Self::ReadBody(_) | Self::InvalidMultipart(_) => http::StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_errors_to_status_codes() {
        assert_eq!(
            HttpError::BodyTooLarge { limit: 10 }.status_code(),
            http::StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            HttpError::InvalidMultipart("x".to_owned()).status_code(),
            http::StatusCode::BAD_REQUEST
        );
    }
}
