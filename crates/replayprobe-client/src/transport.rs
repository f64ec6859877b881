//! TCP transport.
//!
//! Devices sit behind a serial-to-TCP bridge; the harness only ever dials a
//! `host:port` endpoint.

use tokio::net::TcpStream;

use crate::{
    connection::{ConnectionConfig, DecoderConnection},
    error::ConnectError,
};

const TCP_SCHEME: &str = "tcp://";

/// Validate an endpoint and strip an optional `tcp://` prefix.
///
/// # Errors
///
/// - `ConnectError::InvalidEndpoint` if the host is empty or the port is not
///   a non-zero `u16`
pub fn parse_endpoint(endpoint: &str) -> Result<&str, ConnectError> {
    let address = endpoint.strip_prefix(TCP_SCHEME).unwrap_or(endpoint);
    let invalid =
        |reason| ConnectError::InvalidEndpoint { endpoint: endpoint.to_string(), reason };

    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(invalid("expected host:port"));
    };
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid("port must be 1-65535")),
        Ok(_) => Ok(address),
    }
}

/// Open the decoder connection.
///
/// Called once per run; every attack reuses the returned connection.
pub async fn open(
    endpoint: &str,
    config: ConnectionConfig,
) -> Result<DecoderConnection<TcpStream>, ConnectError> {
    let address = parse_endpoint(endpoint)?;

    let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(address))
        .await
        .map_err(|_| ConnectError::Timeout {
            endpoint: address.to_string(),
            after: config.connect_timeout,
        })?
        .map_err(|source| ConnectError::Io { endpoint: address.to_string(), source })?;

    stream
        .set_nodelay(true)
        .map_err(|source| ConnectError::Io { endpoint: address.to_string(), source })?;

    tracing::info!(
        endpoint = address,
        read_timeout = ?config.read_timeout,
        write_timeout = ?config.write_timeout,
        "decoder connection open"
    );

    Ok(DecoderConnection::new(stream, config))
}
