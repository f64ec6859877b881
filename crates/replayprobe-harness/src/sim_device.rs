//! Simulated decoder device.
//!
//! [`SimDevice`] plays the device side of the wire protocol over any async
//! byte stream (an in-memory duplex, a turmoil TCP stream, a real socket).
//! Its anti-replay check is selectable so tests can show the harness telling
//! a hardened decoder apart from weaker ones.

use std::{collections::HashMap, io};

use replayprobe_core::ChannelId;
use replayprobe_proto::{CHUNK_SIZE, Message, MessageHeader, Opcode};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::corpus::unpack_frame;

/// Which frames the simulated decoder refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Timestamps must strictly increase within each channel.
    #[default]
    PerChannel,
    /// Timestamps must strictly increase across all channels.
    Global,
    /// Every well-formed frame is accepted.
    Unchecked,
}

/// Decoder model speaking the device side of the wire protocol.
///
/// Plaintext is the frame payload after the 12-byte channel/timestamp prefix.
#[derive(Debug, Clone, Default)]
pub struct SimDevice {
    policy: ReplayPolicy,
    last_per_channel: HashMap<ChannelId, u64>,
    last_global: Option<u64>,
    debug_chatter: bool,
    line_noise: bool,
}

impl SimDevice {
    /// Create a device with the given replay policy.
    pub fn new(policy: ReplayPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    /// Send a `Debug` message before every reply.
    #[must_use]
    pub fn with_debug_chatter(mut self) -> Self {
        self.debug_chatter = true;
        self
    }

    /// Emit stray boot text, including a bare magic byte, before every reply.
    #[must_use]
    pub fn with_line_noise(mut self) -> Self {
        self.line_noise = true;
        self
    }

    /// Apply the replay policy to one packed frame.
    ///
    /// Returns the plaintext, or the rejection reason.
    pub fn decode_frame(&mut self, raw: &[u8]) -> Result<Vec<u8>, String> {
        let Some((channel, timestamp, payload)) = unpack_frame(raw) else {
            return Err(format!("frame too short: {} bytes", raw.len()));
        };

        match self.policy {
            ReplayPolicy::PerChannel => {
                if let Some(&last) = self.last_per_channel.get(&channel)
                    && timestamp <= last
                {
                    return Err(format!(
                        "stale timestamp {timestamp} on channel {channel} (last {last})"
                    ));
                }
            },
            ReplayPolicy::Global => {
                if let Some(last) = self.last_global
                    && timestamp <= last
                {
                    return Err(format!("stale timestamp {timestamp} (last {last})"));
                }
            },
            ReplayPolicy::Unchecked => {},
        }

        self.last_per_channel.insert(channel, timestamp);
        self.last_global = Some(self.last_global.map_or(timestamp, |last| last.max(timestamp)));
        Ok(payload.to_vec())
    }

    /// Serve requests until the host closes the stream.
    pub async fn serve<S>(mut self, mut stream: S) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let request = match recv_message(&mut stream).await {
                Ok(request) => request,
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(err) => return Err(err),
            };
            tracing::debug!(opcode = %request.opcode, bytes = request.body.len(), "device request");

            let reply = match request.opcode {
                Opcode::Decode => match self.decode_frame(&request.body) {
                    Ok(plaintext) => Message::new(Opcode::Decode, plaintext),
                    Err(reason) => Message::new(Opcode::Error, reason.into_bytes()),
                },
                other => Message::new(Opcode::Error, format!("unsupported {other}").into_bytes()),
            };

            if self.debug_chatter {
                let chatter = format!("handling {} byte {}", request.body.len(), request.opcode);
                send_message(&mut stream, &Message::new(Opcode::Debug, chatter.into_bytes()))
                    .await?;
            }
            if self.line_noise {
                stream.write_all(b"\r\nboot 100%\r\n").await?;
            }
            send_message(&mut stream, &reply).await?;
        }
    }
}

async fn recv_message<S>(stream: &mut S) -> io::Result<Message>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut bytes = [0u8; MessageHeader::SIZE];
    stream.read_exact(&mut bytes).await?;
    let header = MessageHeader::from_bytes(&bytes).map_err(invalid_data)?;
    let opcode = header
        .opcode()
        .ok_or_else(|| invalid_data(format!("unknown opcode {:#04x}", header.opcode_byte())))?;

    if opcode.expects_ack() {
        send_ack(stream).await?;
    }

    let mut body = vec![0u8; header.body_len() as usize];
    for chunk in body.chunks_mut(CHUNK_SIZE) {
        stream.read_exact(chunk).await?;
        if opcode.expects_ack() {
            send_ack(stream).await?;
        }
    }

    Ok(Message::new(opcode, body))
}

async fn send_message<S>(stream: &mut S, message: &Message) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let header = message.header().map_err(invalid_data)?;
    stream.write_all(&header.to_bytes()).await?;
    stream.flush().await?;
    if message.opcode.expects_ack() {
        wait_ack(stream).await?;
    }

    for chunk in message.chunks() {
        stream.write_all(chunk).await?;
        stream.flush().await?;
        if message.opcode.expects_ack() {
            wait_ack(stream).await?;
        }
    }
    Ok(())
}

async fn send_ack<S>(stream: &mut S) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&MessageHeader::new(Opcode::Ack, 0).to_bytes()).await?;
    stream.flush().await
}

async fn wait_ack<S>(stream: &mut S) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut bytes = [0u8; MessageHeader::SIZE];
    stream.read_exact(&mut bytes).await?;
    let header = MessageHeader::from_bytes(&bytes).map_err(invalid_data)?;
    if header.opcode() != Some(Opcode::Ack) {
        return Err(invalid_data(format!("expected ACK, got {header:?}")));
    }
    Ok(())
}

fn invalid_data(err: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}
