//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur during framing or payload handling.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame too short: {len} bytes (minimum header is 13)")]
    ShortFrame { len: usize },

    #[error("invalid protocol signature: expected 'ZBXD', got {0:?}")]
    InvalidSignature([u8; 4]),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid UTF-8 in payload")]
    InvalidUtf8,
}
