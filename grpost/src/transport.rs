//! # HTTP Transport
//!
//! The adapter never reaches for a process-wide HTTP client. Each [`crate::HttpRpcClient`] owns
//! an [`HttpTransport`], so timeouts, proxies, TLS roots and connection pooling are configured
//! per instance, and tests can swap in a recording double.
use crate::BoxError;
use bytes::Bytes;
use http_body::Body as HttpBody;
use std::future::Future;

/// Sends one HTTP request and returns the response with a not-yet-read body.
///
/// Reading the body is left to the caller so that a failure while streaming it in can be
/// told apart from a failure to get a response at all.
pub trait HttpTransport: Send + Sync {
    type ResponseBody: HttpBody<Data = Bytes, Error: Into<BoxError>> + Send;
    type Error: Into<BoxError> + Send;

    fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> impl Future<Output = Result<http::Response<Self::ResponseBody>, Self::Error>> + Send;
}

/// The default transport, backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Uses a preconfigured client (timeouts, proxy, TLS settings, ...).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    type ResponseBody = reqwest::Body;
    type Error = reqwest::Error;

    async fn send(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<http::Response<Self::ResponseBody>, Self::Error> {
        let request = reqwest::Request::try_from(request)?;
        let response = self.client.execute(request).await?;
        Ok(response.into())
    }
}
