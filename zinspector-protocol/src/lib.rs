//! # zinspector-protocol
//!
//! Wire protocol implementation for the Zabbix trapper interface.
//!
//! This crate provides:
//! - Binary framing with a fixed signature and little-endian length prefix
//! - JSON payload serialization/deserialization
//! - The fixed server-statistics request payload

pub mod error;
pub mod frame;
pub mod message;

pub use error::ProtocolError;
pub use frame::{Frame, FRAME_HEADER_SIZE, SIGNATURE};
pub use message::StatsRequest;

/// Flag byte for a basic (uncompressed) request.
pub const BASIC_FLAGS: u8 = 0x01;

/// Default port the trapper listens on.
pub const DEFAULT_TRAPPER_PORT: u16 = 10051;

/// Maximum frame payload size (16 MiB).
///
/// The trapper never legitimately answers a stats request with anything close
/// to this; the limit guards against a corrupt or hostile length field.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;
