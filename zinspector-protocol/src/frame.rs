//! Binary frame format for the trapper protocol.
//!
//! Frame layout (13 byte header + payload, integers little-endian):
//!
//! ```text
//! +-----------+-------+-------------+----------+---------------+
//! | signature | flags | payload_len | reserved | payload       |
//! |  4 bytes  | 1 byte|   4 bytes   | 4 bytes  | payload_len   |
//! +-----------+-------+-------------+----------+---------------+
//! ```
//!
//! The payload is a UTF-8 JSON document. The reserved field is zero on send
//! and ignored on receive.

use crate::error::ProtocolError;
use crate::{BASIC_FLAGS, MAX_PAYLOAD_SIZE};
use bytes::{BufMut, Bytes, BytesMut};

/// Signature bytes identifying trapper frames: "ZBXD".
pub const SIGNATURE: [u8; 4] = *b"ZBXD";

/// Size of the fixed frame header in bytes (4+1+4+4 = 13).
pub const FRAME_HEADER_SIZE: usize = 13;

/// A parsed trapper frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame flags (0x01 for a basic request).
    pub flags: u8,
    /// Frame payload (JSON data).
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new basic frame with the given payload.
    pub fn new(payload: Bytes) -> Self {
        Self {
            flags: BASIC_FLAGS,
            payload,
        }
    }

    /// Creates a new frame from a JSON-serializable value.
    ///
    /// `serde_json::to_vec` produces compact output, so the payload carries
    /// no line breaks or extraneous whitespace.
    pub fn from_json<T: serde::Serialize>(value: &T) -> Result<Self, ProtocolError> {
        let payload = serde_json::to_vec(value)?;
        Ok(Self::new(Bytes::from(payload)))
    }

    /// Encodes the frame into bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        let payload_len = self.payload.len() as u32;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.payload.len());

        // Signature (4 bytes)
        buf.put_slice(&SIGNATURE);

        // Flags (1 byte)
        buf.put_u8(self.flags);

        // Payload length (4 bytes, little-endian)
        buf.put_u32_le(payload_len);

        // Reserved (4 bytes, always zero)
        buf.put_u32_le(0);

        // Payload
        buf.put_slice(&self.payload);

        Ok(buf)
    }

    /// Decodes a frame from a complete byte buffer.
    ///
    /// Only the declared number of payload bytes is taken as payload; excess
    /// trailing bytes are ignored. A buffer shorter than the declared length
    /// yields a truncated payload, which surfaces as a JSON error when the
    /// payload is parsed.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::ShortFrame { len: buf.len() });
        }

        let signature = [buf[0], buf[1], buf[2], buf[3]];
        if signature != SIGNATURE {
            return Err(ProtocolError::InvalidSignature(signature));
        }

        let flags = buf[4];
        let payload_len = u32::from_le_bytes([buf[5], buf[6], buf[7], buf[8]]);
        // buf[9..13] is the reserved field, ignored.

        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let end = FRAME_HEADER_SIZE + payload_len as usize;
        let payload = Bytes::copy_from_slice(&buf[FRAME_HEADER_SIZE..end.min(buf.len())]);

        Ok(Self { flags, payload })
    }

    /// Parses the payload as a JSON value.
    pub fn payload_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let payload =
            std::str::from_utf8(&self.payload).map_err(|_| ProtocolError::InvalidUtf8)?;
        Ok(serde_json::from_str(payload)?)
    }

    /// Returns the declared payload length from a raw 13-byte header.
    ///
    /// Callers streaming from a socket use this to know how many payload
    /// bytes follow the header.
    pub fn payload_len_from_header(header: &[u8; FRAME_HEADER_SIZE]) -> u32 {
        u32::from_le_bytes([header[5], header[6], header[7], header[8]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::StatsRequest;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    #[test]
    fn test_frame_roundtrip() {
        let frame = Frame::from_json(&json!({"request": "zabbix.stats"})).unwrap();
        let encoded = frame.encode().unwrap();

        let decoded = Frame::decode(&encoded).unwrap();
        assert_eq!(decoded.flags, BASIC_FLAGS);

        let value: Value = decoded.payload_json().unwrap();
        assert_eq!(value["request"], "zabbix.stats");
    }

    #[test]
    fn test_header_layout() {
        let frame = Frame::from_json(&StatsRequest::server_stats()).unwrap();
        let encoded = frame.encode().unwrap();

        assert_eq!(&encoded[0..4], b"ZBXD");
        assert_eq!(encoded[4], 0x01);
        let len = u32::from_le_bytes([encoded[5], encoded[6], encoded[7], encoded[8]]);
        assert_eq!(len as usize, encoded.len() - FRAME_HEADER_SIZE);
        assert_eq!(&encoded[9..13], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_payload_is_compact_json() {
        let frame = Frame::from_json(&StatsRequest::server_stats()).unwrap();
        assert_eq!(frame.payload.as_ref(), br#"{"request":"zabbix.stats"}"#);
    }

    #[test]
    fn test_short_frame() {
        let result = Frame::decode(b"ZBXD\x01\x00\x00\x00");
        assert!(matches!(result, Err(ProtocolError::ShortFrame { len: 8 })));
    }

    #[test]
    fn test_invalid_signature() {
        let mut buf = vec![0u8; FRAME_HEADER_SIZE];
        buf[0..4].copy_from_slice(b"BADX");
        let result = Frame::decode(&buf);
        assert!(matches!(result, Err(ProtocolError::InvalidSignature(_))));
    }

    #[test]
    fn test_truncated_payload_fails_json_parse() {
        let frame = Frame::from_json(&json!({"data": "0123456789"})).unwrap();
        let encoded = frame.encode().unwrap();

        // Drop the last few payload bytes; the header still declares the
        // full length.
        let truncated = &encoded[..encoded.len() - 4];
        let decoded = Frame::decode(truncated).unwrap();
        let result: Result<Value, _> = decoded.payload_json();
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_excess_bytes_ignored() {
        let frame = Frame::from_json(&json!({"ok": true})).unwrap();
        let mut encoded = frame.encode().unwrap().to_vec();
        encoded.extend_from_slice(b"trailing garbage");

        let decoded = Frame::decode(&encoded).unwrap();
        let value: Value = decoded.payload_json().unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_frame_too_large() {
        let huge = vec![0u8; (MAX_PAYLOAD_SIZE + 1) as usize];
        let frame = Frame::new(Bytes::from(huge));
        assert!(matches!(
            frame.encode(),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_declared_length_too_large() {
        let mut buf = vec![0u8; FRAME_HEADER_SIZE];
        buf[0..4].copy_from_slice(&SIGNATURE);
        buf[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            Frame::decode(&buf),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_payload_len_from_header() {
        let frame = Frame::from_json(&json!({"a": 1})).unwrap();
        let encoded = frame.encode().unwrap();
        let header: [u8; FRAME_HEADER_SIZE] = encoded[..FRAME_HEADER_SIZE].try_into().unwrap();
        assert_eq!(
            Frame::payload_len_from_header(&header) as usize,
            frame.payload.len()
        );
    }

    proptest! {
        #[test]
        fn prop_json_object_roundtrip(key in "[a-z]{1,16}", value in "[ -~]{0,64}") {
            let original = json!({ key: value });
            let frame = Frame::from_json(&original).unwrap();
            let encoded = frame.encode().unwrap();

            let decoded = Frame::decode(&encoded).unwrap();
            let parsed: Value = decoded.payload_json().unwrap();
            prop_assert_eq!(parsed, original);
        }
    }
}
