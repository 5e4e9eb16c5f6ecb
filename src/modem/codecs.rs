use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

use crate::broadlink::{self, Recording};

/// Text representations of a recorded pulse train, one frame per line
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum CodecType {
    Base64,
    Hex,
    Raw,
}

pub trait Codec {
    type Error;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error>;
    fn encode(&self, recording: &Recording) -> Result<String, Self::Error>;
}

pub fn create_codec(ty: CodecType) -> Box<dyn Codec<Error = CodecError>> {
    match ty {
        CodecType::Base64 => Box::new(BroadlinkBase64),
        CodecType::Hex => Box::new(BroadlinkHex),
        CodecType::Raw => Box::new(Raw),
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to decode hex string: {0}")]
    HexDecodeError(#[from] hex::FromHexError),
    #[error("failed to decode base64 string: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),
    #[error("failed to parse broadlink message: {0}")]
    BroadlinkParseError(#[from] broadlink::ParseError),
    #[error("failed to parse raw message: {0}")]
    RawParseError(String),
    #[error("empty input")]
    EmptyInput,
}

pub struct BroadlinkHex;
impl Codec for BroadlinkHex {
    type Error = CodecError;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error> {
        let decoded = hex::decode(input)?;
        if decoded.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        Ok(Recording::from_bytes(Bytes::from(decoded))?)
    }

    fn encode(&self, recording: &Recording) -> Result<String, Self::Error> {
        Ok(hex::encode(recording.to_bytes()))
    }
}

pub struct BroadlinkBase64;
impl Codec for BroadlinkBase64 {
    type Error = CodecError;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error> {
        let decoded = base64::decode(input)?;
        if decoded.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        Ok(Recording::from_bytes(Bytes::from(decoded))?)
    }

    fn encode(&self, recording: &Recording) -> Result<String, Self::Error> {
        Ok(base64::encode(recording.to_bytes()))
    }
}

pub struct Raw;
impl Codec for Raw {
    type Error = CodecError;

    fn decode(&self, input: &str) -> Result<Recording, Self::Error> {
        // Support IrTransmogrifier's format which looks like `Freq=38000Hz[.....][...]`
        let input = if input.starts_with("Freq=") {
            let mut parts = input.splitn(2, '[');
            parts.next();
            let untrimmed = parts
                .next()
                .ok_or_else(|| CodecError::RawParseError(input.to_owned()))?;
            untrimmed.split(']').next().unwrap_or_default()
        } else {
            input
        };

        if input.trim().is_empty() {
            return Err(CodecError::EmptyInput);
        }

        let msg = irp::Message::parse(input)
            .map_err(|_| CodecError::RawParseError(input.to_owned()))?;
        Ok(Recording::new_ir(
            msg.raw
                .into_iter()
                .map(|t| Duration::from_micros(t as _))
                .collect(),
        ))
    }

    fn encode(&self, recording: &Recording) -> Result<String, Self::Error> {
        Ok(recording.to_raw_format())
    }
}
