//! # Call Errors
//!
//! Every failure of a call is surfaced as an [`HttpRpcError`]; nothing is retried or recovered
//! locally. Codec and transport failures are carried verbatim so their original message is
//! what the caller sees.
//!
//! A server that was reached but answered with a non-`2xx` status produces a [`StatusError`].
//! Servers are expected to put a human readable diagnostic in the body, so the error displays
//! as that body, falling back to the status code only when the body is empty.
use crate::BoxError;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tonic::Code;

/// Errors that can occur while performing a call over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum HttpRpcError {
    #[error(transparent)]
    Encode(BoxError),
    #[error("Invalid request uri '{uri}': '{source}'")]
    InvalidUri {
        uri: String,
        source: http::uri::InvalidUri,
    },
    #[error(transparent)]
    Transport(BoxError),
    #[error("Failed to read response body: '{0}'")]
    BodyRead(#[source] BoxError),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error(transparent)]
    Decode(BoxError),
    #[error("Streaming calls are not supported over HTTP")]
    Unsupported,
    #[error("Call cancelled")]
    Cancelled,
}

/// The server answered, but with a status outside `200..=299`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", self.message())]
pub struct StatusError {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    text: String,
}

impl StatusError {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        let text = String::from_utf8_lossy(&body).into_owned();
        Self {
            status,
            headers,
            body,
            text,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The response body as text. Invalid UTF-8 sequences are replaced; use
    /// [`StatusError::body_bytes`] for the exact payload. May be empty.
    pub fn body(&self) -> &str {
        &self.text
    }

    /// The response body exactly as received.
    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    fn message(&self) -> String {
        if self.text.is_empty() {
            format!("HTTP status code: {}", self.status.as_u16())
        } else {
            self.text.clone()
        }
    }
}

/// HTTP to gRPC status code mapping, as used by gRPC clients for responses that did not
/// carry a `grpc-status`.
fn code_for_http_status(status: StatusCode) -> Code {
    match status {
        StatusCode::BAD_REQUEST => Code::Internal,
        StatusCode::UNAUTHORIZED => Code::Unauthenticated,
        StatusCode::FORBIDDEN => Code::PermissionDenied,
        StatusCode::NOT_FOUND => Code::Unimplemented,
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => Code::Unavailable,
        _ => Code::Unknown,
    }
}

impl From<StatusError> for tonic::Status {
    fn from(err: StatusError) -> Self {
        tonic::Status::new(code_for_http_status(err.status), err.to_string())
    }
}

impl From<HttpRpcError> for tonic::Status {
    fn from(err: HttpRpcError) -> Self {
        let code = match &err {
            HttpRpcError::Status(status) => return status.clone().into(),
            HttpRpcError::Encode(_) | HttpRpcError::Decode(_) => Code::Internal,
            HttpRpcError::InvalidUri { .. } => Code::InvalidArgument,
            HttpRpcError::Transport(_) | HttpRpcError::BodyRead(_) => Code::Unavailable,
            HttpRpcError::Unsupported => Code::Unimplemented,
            HttpRpcError::Cancelled => Code::Cancelled,
        };
        tonic::Status::new(code, err.to_string())
    }
}
