//! Parses protocol messages into [`SensorMetadata`].
//!
//! Requests are parsed strictly (a missing `?` marker is an error), device
//! responses leniently (a missing marker yields an all-empty record that the
//! caller treats as nothing-to-apply).

use crate::codec;
use crate::error::TwinError;

/// Transient record produced by parsing one protocol message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorMetadata {
    /// Sensor identity the message refers to.
    pub uid: String,
    /// Sensor type, when the message carries one.
    pub kind: Option<String>,
    /// Raw status field, when the message carries one. Decode with
    /// [`Status::from_wire`](crate::sensor::Status::from_wire).
    pub status: Option<String>,
    /// Everything after the marker. Not re-stripped of consumed keys;
    /// consumers re-extract what they need.
    pub payload: String,
}

/// Strict parse, used for inbound requests.
pub fn parse_request(message: &str) -> Result<SensorMetadata, TwinError> {
    match message.strip_prefix(codec::MARKER) {
        Some(body) => Ok(parse_body(body)),
        None => Err(TwinError::format(format!(
            "request does not start with '{}': {:?}",
            codec::MARKER,
            message
        ))),
    }
}

/// Lenient parse, used for device responses. A message without the marker
/// yields an all-empty record rather than an error.
pub fn parse_response(message: &str) -> SensorMetadata {
    match message.strip_prefix(codec::MARKER) {
        Some(body) => parse_body(body),
        None => SensorMetadata::default(),
    }
}

fn parse_body(body: &str) -> SensorMetadata {
    let uid = codec::extract(body, "id", codec::PAIR_SEPARATOR);
    let kind = codec::extract(body, "type", codec::PAIR_SEPARATOR);
    let status = codec::extract(body, "status", codec::PAIR_SEPARATOR);

    SensorMetadata {
        uid,
        kind: (!kind.is_empty()).then_some(kind),
        status: (!status.is_empty()).then_some(status),
        payload: body.to_string(),
    }
}

/// True iff the record carries both an identity and a payload.
pub fn check_metadata(metadata: &SensorMetadata) -> bool {
    !metadata.uid.is_empty() && !metadata.payload.is_empty()
}

/// True iff the record is well-formed and addressed to `expected_uid`.
pub fn is_valid(metadata: &SensorMetadata, expected_uid: &str) -> bool {
    check_metadata(metadata) && metadata.uid == expected_uid
}
