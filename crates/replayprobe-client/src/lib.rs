//! Connection to a decoder device.
//!
//! [`DecoderConnection`] drives the acknowledged, chunked message exchange of
//! `replayprobe-proto` over any async byte stream and implements
//! [`Decoder`](replayprobe_core::Decoder). Every read and every write is
//! bounded by the configured timeouts, so a silent device produces
//! [`DecodeError::Timeout`](replayprobe_core::DecodeError::Timeout) instead
//! of hanging the run.

#![forbid(unsafe_code)]

pub mod connection;
pub mod error;
pub mod transport;

pub use connection::{
    ConnectionConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
    DecoderConnection,
};
pub use error::ConnectError;
pub use transport::{open, parse_endpoint};
