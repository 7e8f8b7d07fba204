//! # grpost
//!
//! `grpost` lets code written against a gRPC-style client perform unary calls when the only
//! egress available is plain HTTP (restrictive proxies, serverless gateways, ...).
//!
//! Every unary call becomes exactly one `POST {base_uri}{method_path}` whose body is the
//! encoded request message. A `2xx` response body is decoded as the response message, any
//! other status becomes a [`StatusError`] whose text is the body the server sent back.
//!
//! Streaming calls cannot be carried by a single request/response exchange, so they are
//! rejected up front with [`HttpRpcError::Unsupported`].
//!
//! ## Key Components
//!
//! * **[`HttpRpcClient`]:** The adapter. Owns its configuration and its transport and
//!   implements the [`RpcClient`] contract.
//! * **[`codec`]:** The [`codec::Codec`] trait plus a Protobuf codec for generated
//!   `prost` messages and a JSON codec driven by `prost-reflect` descriptors.
//! * **[`transport`]:** The [`transport::HttpTransport`] trait and its default,
//!   `reqwest`-backed implementation.
//!
//! ## Example
//!
//! ```rust,no_run
//! use grpost::{ClientConfig, HttpRpcClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[derive(Clone, PartialEq, prost::Message)]
//! # struct HelloRequest { #[prost(string, tag = "1")] name: String }
//! # #[derive(Clone, PartialEq, prost::Message)]
//! # struct HelloReply { #[prost(string, tag = "1")] message: String }
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://gateway.example.com").with_authorization_token("s3cr3t");
//! let client = HttpRpcClient::new(config)?;
//!
//! let request = HelloRequest { name: "crab".to_string() };
//! let reply: HelloReply = client
//!     .unary_message(&CancellationToken::new(), "/helloworld.Greeter/SayHello", request)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod transport;

pub use client::{DynamicCallError, DynamicRequest, HttpRpcClient, RpcClient};
pub use config::{ClientConfig, ConfigError};
pub use error::{HttpRpcError, StatusError};

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
