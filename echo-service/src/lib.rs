//! # Echo Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide an HTTP echo server speaking the
//! grpost wire contract, plus matching messages and descriptors, for integration testing.
//! It is not intended for production use.
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use bytes::Bytes;
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, ServiceDescriptorProto,
    field_descriptor_proto::{Label, Type},
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

pub mod pb {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct EchoRequest {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct EchoResponse {
        #[prost(string, tag = "1")]
        pub message: String,
    }
}

pub const UNARY_ECHO_PATH: &str = "/echo.EchoService/UnaryEcho";

/// Sending this message makes the server answer `503` with an empty body.
pub const FAIL_WITHOUT_BODY: &str = "fail-without-body";

/// Sending this message makes the server answer `500` with this body.
pub const FAIL_WITH_BODY: &str = "fail-with-body";

struct EchoState {
    expected_authorization: Option<String>,
}

/// Routes of the echo server. When `authorization_token` is set, calls without the matching
/// bearer credential are answered with `401 invalid token`.
pub fn router(authorization_token: Option<&str>) -> Router {
    let state = EchoState {
        expected_authorization: authorization_token.map(|t| format!("Bearer {t}")),
    };

    Router::new()
        .route(UNARY_ECHO_PATH, post(unary_echo))
        .with_state(Arc::new(state))
}

/// Serves [`router`] on an ephemeral local port and returns its address.
pub async fn spawn(authorization_token: Option<&str>) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(authorization_token);

    tokio::spawn(async move { axum::serve(listener, app).await });

    Ok(addr)
}

async fn unary_echo(
    State(state): State<Arc<EchoState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(expected) = &state.expected_authorization {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected.as_str()) {
            return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
        }
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if content_type != Some("application/grpc") {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "expected application/grpc").into_response();
    }

    let Ok(request) = pb::EchoRequest::decode(body) else {
        return (StatusCode::BAD_REQUEST, "malformed EchoRequest").into_response();
    };

    match request.message.as_str() {
        FAIL_WITHOUT_BODY => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        FAIL_WITH_BODY => (StatusCode::INTERNAL_SERVER_ERROR, FAIL_WITH_BODY).into_response(),
        _ => {
            let response = pb::EchoResponse {
                message: request.message,
            };
            (StatusCode::OK, Bytes::from(response.encode_to_vec())).into_response()
        }
    }
}

fn string_field(name: &str, number: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(Type::String as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

fn method(name: &str, client_streaming: bool, server_streaming: bool) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(".echo.EchoRequest".to_string()),
        output_type: Some(".echo.EchoResponse".to_string()),
        client_streaming: Some(client_streaming),
        server_streaming: Some(server_streaming),
        ..Default::default()
    }
}

/// Descriptors for `echo.proto`, equivalent to:
///
/// ```proto
/// syntax = "proto3";
/// package echo;
///
/// message EchoRequest { string message = 1; }
/// message EchoResponse { string message = 1; }
///
/// service EchoService {
///   rpc UnaryEcho(EchoRequest) returns (EchoResponse);
///   rpc ServerStreamingEcho(EchoRequest) returns (stream EchoResponse);
///   rpc ClientStreamingEcho(stream EchoRequest) returns (EchoResponse);
///   rpc BidirectionalEcho(stream EchoRequest) returns (stream EchoResponse);
/// }
/// ```
pub fn file_descriptor_set() -> FileDescriptorSet {
    let file = FileDescriptorProto {
        name: Some("echo.proto".to_string()),
        package: Some("echo".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            DescriptorProto {
                name: Some("EchoRequest".to_string()),
                field: vec![string_field("message", 1)],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("EchoResponse".to_string()),
                field: vec![string_field("message", 1)],
                ..Default::default()
            },
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("EchoService".to_string()),
            method: vec![
                method("UnaryEcho", false, false),
                method("ServerStreamingEcho", false, true),
                method("ClientStreamingEcho", true, false),
                method("BidirectionalEcho", true, true),
            ],
            ..Default::default()
        }],
        ..Default::default()
    };

    FileDescriptorSet { file: vec![file] }
}

pub fn descriptor_pool() -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(file_descriptor_set())
        .expect("echo.proto descriptors are valid")
}
