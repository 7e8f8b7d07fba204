use bytes::Bytes;
use grpost::{BoxError, transport::HttpTransport};
use http::StatusCode;
use http_body_util::{BodyExt, Full, StreamBody, combinators::BoxBody};
use std::{
    io,
    sync::{Arc, Mutex},
};

pub type MockBody = BoxBody<Bytes, BoxError>;

/// How the mock answers every request it records.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(StatusCode, Bytes),
    /// Answers with a status, then fails while the body is being read.
    BrokenBody(StatusCode),
    Refuse,
    /// Never answers.
    Hang,
}

/// What the mock saw of one outgoing request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: http::Method,
    pub uri: String,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

/// A transport double that records every request it is asked to send.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    reply: Reply,
}

impl RecordingTransport {
    pub fn new(reply: Reply) -> Self {
        Self {
            requests: Arc::default(),
            reply,
        }
    }

    pub fn respond(status: u16, body: impl Into<Bytes>) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        Self::new(Reply::Respond(status, body.into()))
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for RecordingTransport {
    type ResponseBody = MockBody;
    type Error = io::Error;

    async fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Self::ResponseBody>, Self::Error> {
        let (parts, body) = request.into_parts();
        self.requests.lock().unwrap().push(RecordedRequest {
            method: parts.method,
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body,
        });

        let (status, body) = match self.reply.clone() {
            Reply::Respond(status, body) => {
                let body = Full::new(body)
                    .map_err(|never| -> BoxError { match never {} })
                    .boxed();
                (status, body)
            }
            Reply::BrokenBody(status) => {
                let frames = futures_util::stream::iter(vec![Err::<http_body::Frame<Bytes>, BoxError>(
                    Box::new(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
                )]);
                (status, StreamBody::new(frames).boxed())
            }
            Reply::Refuse => {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ));
            }
            Reply::Hang => std::future::pending().await,
        };

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        Ok(response)
    }
}
