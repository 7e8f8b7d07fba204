//! # Dynamic Calls
//!
//! Unary calls driven by a `DescriptorPool` instead of generated code. The caller names a
//! service and a method, passes a JSON body, and gets JSON back; the [`JsonCodec`] transcodes
//! to and from Protobuf using the method's descriptors.
use super::{DynamicRequest, HttpRpcClient};
use crate::{HttpRpcError, codec::JsonCodec, transport::HttpTransport};
use log::warn;
use prost_reflect::{DescriptorPool, MethodDescriptor};
use tokio_util::sync::CancellationToken;
use tonic::{
    Extensions,
    metadata::{
        AsciiMetadataKey, AsciiMetadataValue, MetadataMap,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
};

/// Failures of [`HttpRpcClient::dynamic`]. Lookup and header problems are detected before any
/// HTTP request is made; everything after that is a [`HttpRpcError`].
#[derive(Debug, thiserror::Error)]
pub enum DynamicCallError {
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error("Method '{0}' not found")]
    MethodNotFound(String),
    #[error("'{name}' cannot be sent as an HTTP header name: '{source}'")]
    InvalidHeaderName {
        name: String,
        source: InvalidMetadataKey,
    },
    #[error("Value of header '{name}' is not a valid HTTP header value: '{source}'")]
    InvalidHeaderValue {
        name: String,
        source: InvalidMetadataValue,
    },
    #[error(transparent)]
    Call(#[from] HttpRpcError),
}

impl<T: HttpTransport> HttpRpcClient<T> {
    /// Executes a dynamic unary call using the schema found in `pool`.
    ///
    /// Methods that stream in either direction are rejected with
    /// [`HttpRpcError::Unsupported`] before anything is sent.
    pub async fn dynamic(
        &self,
        cancel: &CancellationToken,
        pool: &DescriptorPool,
        request: DynamicRequest,
    ) -> Result<serde_json::Value, DynamicCallError> {
        let method = pool
            .get_service_by_name(&request.service)
            .ok_or_else(|| DynamicCallError::ServiceNotFound(request.service.clone()))?
            .methods()
            .find(|m| m.name() == request.method)
            .ok_or_else(|| DynamicCallError::MethodNotFound(request.method.clone()))?;

        let path = http_path(&method);

        if method.is_client_streaming() || method.is_server_streaming() {
            warn!(path = path.as_str(); "Rejecting streaming method, only unary calls can be sent over HTTP");
            return Err(HttpRpcError::Unsupported.into());
        }

        let codec = JsonCodec::new(method.input(), method.output());
        let metadata = header_metadata(request.headers)?;
        let call = tonic::Request::from_parts(metadata, Extensions::default(), request.body);

        let response = self.unary(cancel, &path, call, codec).await?;
        Ok(response.into_inner())
    }
}

fn http_path(method: &MethodDescriptor) -> String {
    format!("/{}/{}", method.parent_service().full_name(), method.name())
}

/// Turns `(name, value)` pairs into the metadata that becomes the POST's extra headers.
/// Only ASCII entries are accepted; there is no `-bin` encoding over plain HTTP.
fn header_metadata(headers: Vec<(String, String)>) -> Result<MetadataMap, DynamicCallError> {
    let mut metadata = MetadataMap::with_capacity(headers.len());
    for (name, value) in headers {
        let value = match value.parse::<AsciiMetadataValue>() {
            Ok(value) => value,
            Err(source) => return Err(DynamicCallError::InvalidHeaderValue { name, source }),
        };
        let key = match name.parse::<AsciiMetadataKey>() {
            Ok(key) => key,
            Err(source) => return Err(DynamicCallError::InvalidHeaderName { name, source }),
        };
        metadata.append(key, value);
    }
    Ok(metadata)
}
