//! Client error types.

use thiserror::Error;
use zinspector_protocol::ProtocolError;

/// Network errors for a single trapper exchange.
///
/// Every failure mode of the client (connect, send, read, decode) is
/// normalized to one of these variants; none of them are retried here.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection timeout")]
    Timeout,

    #[error("short header: connection closed after {got} of 13 bytes")]
    ShortHeader { got: usize },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
