//! # zinspector-client
//!
//! Client for the trapper interface of a running monitoring server.
//!
//! This crate provides:
//! - A one-shot TCP client sending a single framed statistics request
//! - A two-stage read tolerant of partial socket reads
//! - Timeout and error normalization (all failures are [`NetworkError`])
//!
//! Retry policy, if any, belongs to the caller; a single exchange either
//! produces a decoded JSON value or one `NetworkError`.

pub mod client;
pub mod error;

pub use client::{ClientConfig, TrapperClient};
pub use error::NetworkError;
