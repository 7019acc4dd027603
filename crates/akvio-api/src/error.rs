use thiserror::Error;

/// Errors surfaced by the platform client.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL could not be parsed.
    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    /// The API key was rejected (HTTP 401).
    #[error("invalid or expired API key")]
    InvalidApiKey,

    /// The API key could not be sent as a header value.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Any other non-success response from the platform.
    #[error("platform API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("failed to deserialize response: {message}")]
    Deserialization { message: String, body: String },
}
