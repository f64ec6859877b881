//! Message opcodes.

/// Message type carried in the second header byte.
///
/// Discriminants are the ASCII letters the device firmware switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Decode a frame; the response carries the plaintext.
    Decode = b'D',
    /// Install a channel subscription.
    Subscribe = b'S',
    /// List active subscriptions.
    List = b'L',
    /// Acknowledge a header or body chunk.
    Ack = b'A',
    /// Free-form debug text emitted by the device.
    Debug = b'G',
    /// The device refused the request; the body is the reason.
    Error = b'E',
}

impl Opcode {
    /// Parse an opcode byte. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            b'D' => Some(Self::Decode),
            b'S' => Some(Self::Subscribe),
            b'L' => Some(Self::List),
            b'A' => Some(Self::Ack),
            b'G' => Some(Self::Debug),
            b'E' => Some(Self::Error),
            _ => None,
        }
    }

    /// Raw opcode byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether the receiver acknowledges this message's header and chunks.
    ///
    /// `Ack` messages are never acknowledged (that would never terminate) and
    /// `Debug` messages are fire-and-forget.
    #[must_use]
    pub fn expects_ack(self) -> bool {
        !matches!(self, Self::Ack | Self::Debug)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Decode => "DECODE",
            Self::Subscribe => "SUBSCRIBE",
            Self::List => "LIST",
            Self::Ack => "ACK",
            Self::Debug => "DEBUG",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}
