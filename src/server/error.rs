use thiserror::Error;

/// Failures raised by the request/response surface of a [`super::Context`].
#[derive(Debug, Error)]
pub enum ContextError {
    /// A response was already committed for this request.
    #[error("response already sent")]
    AlreadySent,

    /// The request carried no body.
    #[error("no body found")]
    NoBody,

    /// The body was read as JSON but the content type says otherwise.
    #[error("content-type is not application/json (got `{content_type}`)")]
    NotJson { content_type: String },

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("failed to serialize response body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Browsers reject `SameSite=None` cookies that are not `Secure`.
    #[error("cookie `{name}`: SameSite=None requires Secure")]
    InsecureSameSite { name: String },

    /// The request body exceeded the configured limit.
    #[error("request body of {size} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { size: usize, limit: usize },
}
