//! Host side of the decoder message exchange.
//!
//! Every message is a 4-byte header followed by a body sent in
//! [`CHUNK_SIZE`] slices. Except for `Ack` and `Debug`, the receiver
//! acknowledges the header and each chunk before the sender continues.
//!
//! ```text
//! host                          device
//!  │ ── %D len ───────────────────> │
//!  │ <─────────────────────── %A 0 ─│
//!  │ ── chunk[0..256] ────────────> │
//!  │ <─────────────────────── %A 0 ─│
//!  │            ...                 │
//!  │ <─────────────── %D len ───────│   (or %E len: rejected)
//!  │ ── %A 0 ─────────────────────> │
//!  │ <─────────────── chunk ────────│
//!  │ ── %A 0 ─────────────────────> │
//! ```

use std::{io, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use replayprobe_core::{DecodeError, DecodeOutcome, Decoder, Direction};
use replayprobe_proto::{CHUNK_SIZE, Message, MessageHeader, Opcode, ProtocolError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bound on a single read from the device.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on a single write to the device.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Stray bytes tolerated while hunting for a header before giving up.
const MAX_NOISE_BYTES: usize = 4096;

/// Connection configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Timeout for each read
    pub read_timeout: Duration,
    /// Timeout for each write (including flush)
    pub write_timeout: Duration,
    /// Timeout for opening the connection
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Decoder connection over any async byte stream.
///
/// One request is in flight at a time. The connection is reused across all
/// attacks of a run, so device-side replay state carries over between them.
///
/// A request that fails part-way (timeout, I/O error, protocol violation)
/// leaves the stream at an unknown position. The connection is then
/// desynchronized and every later request fails with
/// [`DecodeError::Desynchronized`] rather than reading a stale reply.
#[derive(Debug)]
pub struct DecoderConnection<S> {
    stream: S,
    config: ConnectionConfig,
    desynchronized: bool,
}

impl<S> DecoderConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-open stream.
    pub fn new(stream: S, config: ConnectionConfig) -> Self {
        Self { stream, config, desynchronized: false }
    }

    /// Configured timeouts.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns true once an exchange has been abandoned part-way.
    pub fn is_desynchronized(&self) -> bool {
        self.desynchronized
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Send a message and return the device's reply.
    ///
    /// `Debug` messages from the device are logged and skipped. If the device
    /// answers with `Error` in place of an acknowledgement, that `Error` is
    /// the reply.
    ///
    /// # Errors
    ///
    /// - `DecodeError::Timeout` if any single read or write exceeds its bound
    /// - `DecodeError::Closed` if the device hangs up
    /// - `DecodeError::Protocol` or `DecodeError::Wire` if the device breaks
    ///   the exchange rules
    /// - `DecodeError::Desynchronized` if an earlier request failed part-way
    pub async fn request(&mut self, message: &Message) -> Result<Message, DecodeError> {
        if self.desynchronized {
            return Err(DecodeError::Desynchronized);
        }
        let header = message.header()?;

        let result = self.exchange(message, header).await;
        if let Err(err) = &result
            && !matches!(err, DecodeError::Closed)
        {
            self.desynchronized = true;
            tracing::warn!(error = %err, "exchange abandoned, connection out of sync");
        }
        result
    }

    async fn exchange(
        &mut self,
        message: &Message,
        header: MessageHeader,
    ) -> Result<Message, DecodeError> {
        if let Some(refusal) = self.send(message, header).await? {
            return Ok(refusal);
        }
        self.next_message().await
    }

    async fn send(
        &mut self,
        message: &Message,
        header: MessageHeader,
    ) -> Result<Option<Message>, DecodeError> {
        let acked = message.opcode.expects_ack();

        tracing::trace!(opcode = %message.opcode, bytes = message.body.len(), "sending");
        self.write(&header.to_bytes()).await?;
        if acked && let Some(refusal) = self.await_ack().await? {
            return Ok(Some(refusal));
        }

        for chunk in message.chunks() {
            self.write(chunk).await?;
            if acked && let Some(refusal) = self.await_ack().await? {
                return Ok(Some(refusal));
            }
        }
        Ok(None)
    }

    /// `None` on ACK, the message on an early `Error`.
    async fn await_ack(&mut self) -> Result<Option<Message>, DecodeError> {
        let message = self.next_message().await?;
        match message.opcode {
            Opcode::Ack => Ok(None),
            Opcode::Error => Ok(Some(message)),
            other => Err(DecodeError::Protocol(format!("expected ACK, got {other}"))),
        }
    }

    async fn next_message(&mut self) -> Result<Message, DecodeError> {
        loop {
            let message = self.receive().await?;
            if message.opcode == Opcode::Debug {
                tracing::debug!(text = %message.body_text(), "decoder debug");
                continue;
            }
            return Ok(message);
        }
    }

    async fn receive(&mut self) -> Result<Message, DecodeError> {
        let header = self.read_header().await?;
        let opcode =
            header.opcode().ok_or(ProtocolError::UnknownOpcode(header.opcode_byte()))?;
        let acked = opcode.expects_ack();

        if acked {
            self.send_ack().await?;
        }

        let mut body = vec![0u8; header.body_len() as usize];
        for chunk in body.chunks_mut(CHUNK_SIZE) {
            self.read_exact(chunk).await?;
            if acked {
                self.send_ack().await?;
            }
        }

        tracing::trace!(opcode = %opcode, bytes = body.len(), "received");
        Ok(Message::new(opcode, body))
    }

    /// Read the next valid header, discarding noise before it.
    ///
    /// A magic byte followed by anything that does not parse as a header
    /// (boot text such as `100%`) is noise too; scanning resumes at the next
    /// magic byte inside the rejected window.
    async fn read_header(&mut self) -> Result<MessageHeader, DecodeError> {
        let mut window = [0u8; MessageHeader::SIZE];
        let mut filled = 0usize;
        let mut skipped = 0usize;
        loop {
            if skipped > MAX_NOISE_BYTES {
                return Err(DecodeError::Protocol(format!(
                    "no message header within {MAX_NOISE_BYTES} bytes"
                )));
            }

            self.read_exact(&mut window[filled..=filled]).await?;
            if filled == 0 && window[0] != MessageHeader::MAGIC {
                skipped += 1;
                continue;
            }
            filled += 1;
            if filled < MessageHeader::SIZE {
                continue;
            }

            if let Ok(header) = MessageHeader::from_bytes(&window) {
                if skipped > 0 {
                    tracing::debug!(skipped, "discarded bytes before header");
                }
                return Ok(*header);
            }
            let next = window[1..]
                .iter()
                .position(|&byte| byte == MessageHeader::MAGIC)
                .map_or(MessageHeader::SIZE, |offset| offset + 1);
            window.copy_within(next.., 0);
            filled = MessageHeader::SIZE - next;
            skipped += next;
        }
    }

    async fn send_ack(&mut self) -> Result<(), DecodeError> {
        self.write(&MessageHeader::new(Opcode::Ack, 0).to_bytes()).await
    }

    async fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), DecodeError> {
        let after = self.config.read_timeout;
        match tokio::time::timeout(after, self.stream.read_exact(buf)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(transport_error(err)),
            Err(_) => Err(DecodeError::Timeout { direction: Direction::Read, after }),
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let after = self.config.write_timeout;
        let stream = &mut self.stream;
        let write = async move {
            stream.write_all(bytes).await?;
            stream.flush().await
        };
        match tokio::time::timeout(after, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(transport_error(err)),
            Err(_) => Err(DecodeError::Timeout { direction: Direction::Write, after }),
        }
    }
}

fn transport_error(err: io::Error) -> DecodeError {
    match err.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => DecodeError::Closed,
        _ => DecodeError::Io(err),
    }
}

#[async_trait]
impl<S> Decoder for DecoderConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn decode(&mut self, frame: &[u8]) -> Result<DecodeOutcome, DecodeError> {
        let request = Message::new(Opcode::Decode, Bytes::copy_from_slice(frame));
        let reply = self.request(&request).await?;

        match reply.opcode {
            Opcode::Decode => Ok(DecodeOutcome::Plaintext(reply.body)),
            Opcode::Error => Ok(DecodeOutcome::Rejected { reason: reply.body_text() }),
            other => Err(DecodeError::Protocol(format!("unexpected {other} reply to DECODE"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hangups_map_to_closed() {
        for kind in [io::ErrorKind::UnexpectedEof, io::ErrorKind::BrokenPipe] {
            assert!(matches!(transport_error(io::Error::from(kind)), DecodeError::Closed));
        }
        assert!(matches!(
            transport_error(io::Error::from(io::ErrorKind::PermissionDenied)),
            DecodeError::Io(_)
        ));
    }

    #[test]
    fn default_timeouts_are_five_seconds() {
        let config = ConnectionConfig::default();
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert_eq!(config.write_timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }
}
