//! # Message Codecs
//!
//! A [`Codec`] turns the caller's request into the bytes of the HTTP body and the bytes of a
//! successful response back into a value. There is no gRPC length-prefix framing: the encoded
//! message *is* the body.
//!
//! Two codecs are provided:
//!
//! * [`ProstCodec`]: For generated `prost` messages. The message types are fixed at compile
//!   time, so a request of the wrong type simply does not type-check.
//! * [`JsonCodec`]: Bridges `serde_json::Value` and Protobuf bytes using `prost-reflect`
//!   descriptors, for callers that only know the schema at runtime.
//!
//! ## How the JSON codec works
//!
//! 1. **Encode (JSON -> Proto)**: The JSON value is validated against the input
//!    `MessageDescriptor` by deserializing it into a `DynamicMessage`, which is then encoded.
//! 2. **Decode (Proto -> JSON)**: The bytes are decoded into a `DynamicMessage` of the output
//!    descriptor and converted back into a `serde_json::Value`.
use crate::BoxError;
use bytes::{Bytes, BytesMut};
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use std::marker::PhantomData;

/// Encodes requests into HTTP bodies and decodes successful response bodies.
pub trait Codec {
    /// The request type this codec encodes.
    type Encode;
    /// The response type this codec decodes.
    type Decode;
    type Error: Into<BoxError>;

    fn encode(&mut self, item: Self::Encode) -> Result<Bytes, Self::Error>;

    fn decode(&mut self, buf: Bytes) -> Result<Self::Decode, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProstCodecError {
    #[error(transparent)]
    Encode(#[from] prost::EncodeError),
    #[error(transparent)]
    Decode(#[from] prost::DecodeError),
}

/// Codec for compile-time known `prost` messages.
#[derive(Debug)]
pub struct ProstCodec<E, D> {
    _marker: PhantomData<fn(E) -> D>,
}

impl<E, D> ProstCodec<E, D> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E, D> Default for ProstCodec<E, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, D> Codec for ProstCodec<E, D>
where
    E: Message,
    D: Message + Default,
{
    type Encode = E;
    type Decode = D;
    type Error = ProstCodecError;

    fn encode(&mut self, item: Self::Encode) -> Result<Bytes, Self::Error> {
        let mut buf = BytesMut::with_capacity(item.encoded_len());
        item.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    fn decode(&mut self, buf: Bytes) -> Result<Self::Decode, Self::Error> {
        Ok(D::decode(buf)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JsonCodecError {
    #[error("JSON structure does not match Protobuf schema: {0}")]
    SchemaMismatch(#[source] serde_json::Error),
    #[error("Failed to decode Protobuf bytes: {0}")]
    Decode(#[source] prost::DecodeError),
    #[error("Failed to map response to JSON: {0}")]
    ToJson(#[source] serde_json::Error),
}

/// Lets callers without generated types post JSON: the request value is checked against
/// `req_desc` and written as the raw Protobuf POST body, and a `2xx` body is read back through
/// `res_desc` into JSON.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    req_desc: MessageDescriptor,
    res_desc: MessageDescriptor,
}

impl JsonCodec {
    pub fn new(req_desc: MessageDescriptor, res_desc: MessageDescriptor) -> Self {
        Self { req_desc, res_desc }
    }
}

impl Codec for JsonCodec {
    type Encode = serde_json::Value;
    type Decode = serde_json::Value;
    type Error = JsonCodecError;

    fn encode(&mut self, item: Self::Encode) -> Result<Bytes, Self::Error> {
        // serde_json::Value is itself a Deserializer.
        let msg = DynamicMessage::deserialize(self.req_desc.clone(), item)
            .map_err(JsonCodecError::SchemaMismatch)?;

        Ok(msg.encode_to_vec().into())
    }

    fn decode(&mut self, buf: Bytes) -> Result<Self::Decode, Self::Error> {
        let msg =
            DynamicMessage::decode(self.res_desc.clone(), buf).map_err(JsonCodecError::Decode)?;

        serde_json::to_value(&msg).map_err(JsonCodecError::ToJson)
    }
}
