//! # HTTP RPC Client
//!
//! [`HttpRpcClient`] carries gRPC-shaped calls over plain HTTP/1.1 request/response exchanges.
//!
//! ## How it works
//!
//! For a unary call to `/package.Service/Method` the client:
//!
//! 1. Encodes the request with the supplied [`Codec`]. The bytes are sent as-is, without the
//!    5-byte gRPC length prefix.
//! 2. Sends `POST {base_uri}/package.Service/Method` with `Content-Type: application/grpc`
//!    and, when a token is configured, `Authorization: Bearer <token>`. Request metadata
//!    becomes additional HTTP headers, except for framing, hop-by-hop, credential and `grpc-`
//!    headers which only the client and its transport set.
//! 3. Reads the whole response body. A `2xx` body is decoded into the response, anything else
//!    is returned as a [`StatusError`].
//!
//! Streaming calls are rejected with [`HttpRpcError::Unsupported`] before anything is sent.
//!
//! ## Cancellation
//!
//! Every call takes a [`CancellationToken`]. The exchange (sending the request and reading the
//! body) races the token, and a cancelled token ends the call with [`HttpRpcError::Cancelled`].
pub mod dynamic;
mod types;

pub use dynamic::DynamicCallError;
pub use types::*;

use crate::{
    ClientConfig, ConfigError, HttpRpcError, StatusError,
    codec::{Codec, ProstCodec},
    transport::{HttpTransport, ReqwestTransport},
};
use bytes::Bytes;
use futures_util::{Stream, stream::BoxStream};
use http::{
    HeaderMap, HeaderValue, Method, Uri,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use http_body_util::BodyExt;
use log::{debug, warn};
use std::{fmt, future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tonic::{Extensions, metadata::MetadataMap};

/// Value of the `Content-Type` header sent with every call. Servers that branch on it expect
/// the gRPC label even though the body is a single bare message.
pub const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// Headers owned by the adapter or the transport. Request metadata never sets them, and
/// neither does any `grpc-` prefixed entry.
const RESERVED_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "content-type",
    "content-length",
    "transfer-encoding",
    "host",
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "upgrade",
];

/// The unary-plus-streaming surface of a gRPC-style client.
///
/// Code written against this trait does not need to know whether calls travel over a native
/// gRPC channel or over plain HTTP.
pub trait RpcClient {
    type Error;

    /// Performs a Unary call (Single Request -> Single Response).
    fn unary<C>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        request: tonic::Request<C::Encode>,
        codec: C,
    ) -> impl Future<Output = Result<tonic::Response<C::Decode>, Self::Error>> + Send
    where
        C: Codec + Send,
        C::Encode: Send,
        C::Decode: Send;

    /// Opens a Bidirectional Streaming call (Stream of Requests -> Stream of Responses).
    #[allow(clippy::type_complexity)]
    fn streaming<C, S>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        request: tonic::Request<S>,
        codec: C,
    ) -> impl Future<
        Output = Result<
            tonic::Response<BoxStream<'static, Result<C::Decode, Self::Error>>>,
            Self::Error,
        >,
    > + Send
    where
        C: Codec + Send,
        C::Decode: Send + 'static,
        S: Stream<Item = C::Encode> + Send + 'static;
}

/// A client performing gRPC-style unary calls over HTTP POST.
///
/// Cloning is cheap; clones share the configuration and the transport.
pub struct HttpRpcClient<T = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    config: ClientConfig,
    authorization: Option<HeaderValue>,
    transport: T,
}

impl<T> Clone for HttpRpcClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for HttpRpcClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRpcClient")
            .field("base_uri", &self.inner.config.base_uri)
            .field("transport", &self.inner.transport)
            .finish_non_exhaustive()
    }
}

impl HttpRpcClient<ReqwestTransport> {
    /// Creates a client backed by a default `reqwest::Client`.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpRpcClient)` - The ready to use client.
    /// * `Err(ConfigError)` - If the base uri or the authorization token are invalid.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_transport(config, ReqwestTransport::default())
    }
}

impl<T: HttpTransport> HttpRpcClient<T> {
    /// Creates a client that sends its requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate_base_uri()?;
        let authorization = config.authorization_header()?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                authorization,
                transport,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Performs a Unary call as a single HTTP POST exchange.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Aborts the in-flight exchange when cancelled.
    /// * `path` - Appended verbatim to the base uri (e.g. `/package.Service/Method`).
    /// * `request` - The message plus metadata, sent as HTTP headers.
    /// * `codec` - Encodes the request and decodes a successful response.
    ///
    /// # Returns
    ///
    /// * `Ok(Response)` - The decoded message, with the response headers as metadata.
    /// * `Err(HttpRpcError)` - Encoding, transport, status or decoding failure.
    pub async fn unary<C>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        request: tonic::Request<C::Encode>,
        mut codec: C,
    ) -> Result<tonic::Response<C::Decode>, HttpRpcError>
    where
        C: Codec,
    {
        let (metadata, _, message) = request.into_parts();
        let body = codec
            .encode(message)
            .map_err(|e| HttpRpcError::Encode(e.into()))?;
        let request = self.build_request(path, metadata, body)?;

        debug!(path = path; "Sending unary call over HTTP");

        let (parts, body) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(path = path; "Unary call cancelled");
                return Err(HttpRpcError::Cancelled);
            }
            exchange = self.exchange(request) => exchange?,
        };

        if !parts.status.is_success() {
            debug!(path = path, status = parts.status.as_u16(); "Unary call failed with HTTP status");
            return Err(StatusError::new(parts.status, parts.headers, body).into());
        }

        let message = codec
            .decode(body)
            .map_err(|e| HttpRpcError::Decode(e.into()))?;

        Ok(tonic::Response::from_parts(
            MetadataMap::from_headers(parts.headers),
            message,
            Extensions::default(),
        ))
    }

    /// Performs a Unary call with compile-time known `prost` messages.
    pub async fn unary_message<Req, Res>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        request: Req,
    ) -> Result<Res, HttpRpcError>
    where
        Req: prost::Message,
        Res: prost::Message + Default,
    {
        let response = self
            .unary(
                cancel,
                path,
                tonic::Request::new(request),
                ProstCodec::<Req, Res>::new(),
            )
            .await?;

        Ok(response.into_inner())
    }

    /// Rejects a streaming call.
    ///
    /// A single request/response exchange cannot carry a duplex stream of messages, so this
    /// always returns [`HttpRpcError::Unsupported`] without touching the network or polling
    /// `request`.
    #[allow(clippy::type_complexity)]
    pub fn streaming<C, S>(
        &self,
        _cancel: &CancellationToken,
        path: &str,
        _request: tonic::Request<S>,
        _codec: C,
    ) -> Result<tonic::Response<BoxStream<'static, Result<C::Decode, HttpRpcError>>>, HttpRpcError>
    where
        C: Codec,
    {
        warn!(path = path; "Rejecting streaming call, only unary calls can be sent over HTTP");
        Err(HttpRpcError::Unsupported)
    }

    fn build_request(
        &self,
        path: &str,
        metadata: MetadataMap,
        body: Bytes,
    ) -> Result<http::Request<Bytes>, HttpRpcError> {
        let uri = format!("{}{}", self.inner.config.base_uri, path);
        let uri = match uri.parse::<Uri>() {
            Ok(parsed) => parsed,
            Err(source) => return Err(HttpRpcError::InvalidUri { uri, source }),
        };

        let mut request = http::Request::new(body);
        *request.method_mut() = Method::POST;
        *request.uri_mut() = uri;
        *request.headers_mut() = metadata_headers(metadata);

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(GRPC_CONTENT_TYPE));
        if let Some(authorization) = &self.inner.authorization {
            headers.insert(AUTHORIZATION, authorization.clone());
        }

        Ok(request)
    }

    /// Sends the request and reads the whole response body.
    async fn exchange(
        &self,
        request: http::Request<Bytes>,
    ) -> Result<(http::response::Parts, Bytes), HttpRpcError> {
        let response = self
            .inner
            .transport
            .send(request)
            .await
            .map_err(|e| HttpRpcError::Transport(e.into()))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| HttpRpcError::BodyRead(e.into()))?
            .to_bytes();

        Ok((parts, body))
    }
}

/// Turns request metadata into HTTP headers, dropping everything that would change how the
/// single-body POST is framed, routed or authenticated, plus gRPC protocol headers that mean
/// nothing over plain HTTP.
fn metadata_headers(metadata: MetadataMap) -> HeaderMap {
    let mut headers = metadata.into_headers();
    let grpc_headers: Vec<_> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("grpc-"))
        .cloned()
        .collect();

    for name in RESERVED_HEADERS.iter().copied() {
        headers.remove(name);
    }
    for name in grpc_headers {
        headers.remove(name);
    }
    headers
}

impl<T: HttpTransport> RpcClient for HttpRpcClient<T> {
    type Error = HttpRpcError;

    fn unary<C>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        request: tonic::Request<C::Encode>,
        codec: C,
    ) -> impl Future<Output = Result<tonic::Response<C::Decode>, Self::Error>> + Send
    where
        C: Codec + Send,
        C::Encode: Send,
        C::Decode: Send,
    {
        HttpRpcClient::unary(self, cancel, path, request, codec)
    }

    fn streaming<C, S>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        request: tonic::Request<S>,
        codec: C,
    ) -> impl Future<
        Output = Result<
            tonic::Response<BoxStream<'static, Result<C::Decode, Self::Error>>>,
            Self::Error,
        >,
    > + Send
    where
        C: Codec + Send,
        C::Decode: Send + 'static,
        S: Stream<Item = C::Encode> + Send + 'static,
    {
        std::future::ready(HttpRpcClient::streaming(self, cancel, path, request, codec))
    }
}
