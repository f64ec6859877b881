//! Connection setup errors.

use std::{io, time::Duration};

use thiserror::Error;

/// Failure opening the decoder connection. Fatal: the run never starts.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Endpoint is not `host:port` (optionally prefixed with `tcp://`).
    #[error("invalid decoder endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as given
        endpoint: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// No connection within the connect timeout.
    #[error("connecting to {endpoint} timed out after {after:?}")]
    Timeout {
        /// Endpoint being dialed
        endpoint: String,
        /// Configured bound
        after: Duration,
    },

    /// Connection refused, unreachable host, DNS failure, etc.
    #[error("failed to connect to {endpoint}")]
    Io {
        /// Endpoint being dialed
        endpoint: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}
