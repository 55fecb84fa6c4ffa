//! Handshake state machine.
//!
//! This module owns the message catalogue (`message`), the sequence
//! tables (`sequence`), and the I/O drivers plus the negotiate loop
//! (`io`). The per-connection cursor into the active sequence lives in
//! `HandshakeState`.

pub mod io;
pub mod message;
pub mod sequence;

pub use message::{HandshakeMessage, MessageAction, Writer};
pub use sequence::{handshake_type_name, message_sequence, HandshakeType};

use crate::buffer::Buffer;
use crate::connection::HandshakeContext;
use crate::transcript::Transcript;
use crate::TlsError;

/// Upper bound on a single handshake message, header included.
///
/// Nothing legitimate comes close; a larger declared length is a protocol
/// violation, not a buffering problem.
pub const MAX_HANDSHAKE_MESSAGE_LENGTH: usize = 64 * 1024;

/// Per-message handler interface.
///
/// The engine decides *when* a message is encoded or decoded; the handler
/// decides *what* the bytes mean. Whichever peer writes a message encodes
/// it and the other decodes it, so a handler picks its direction from
/// `ctx.mode` and the message's writer role.
///
/// Inbound, `ctx.handshake.io_buffer` holds exactly the message body;
/// outbound it is empty and the handler appends the body. Inbound
/// handlers observe the transcript in its pre-update state: a message is
/// hashed only after its handler has run.
pub trait MessageHandlers {
    /// Encode or decode one logical message.
    fn handle(
        &mut self,
        msg: HandshakeMessage,
        ctx: &mut HandshakeContext<'_>,
    ) -> Result<(), TlsError>;
}

/// Per-connection handshake state: the sequence cursor, the message
/// reassembly buffer, and the running transcript.
pub struct HandshakeState {
    /// Shape of this handshake; mutated only by the resolver and the
    /// adaptive mid-flight adjustments.
    pub handshake_type: HandshakeType,
    /// Ordinal position in the active sequence. Strictly non-decreasing.
    pub message_number: usize,
    /// Reassembly and serialization buffer for the current message.
    pub io_buffer: Buffer,
    /// Running transcript hashes.
    pub transcript: Transcript,
    /// Rendered handshake-type name, cached per bitmask value.
    name_cache: Option<(HandshakeType, String)>,
}

impl HandshakeState {
    /// Fresh state at the start of a connection.
    pub fn new() -> Self {
        Self {
            handshake_type: HandshakeType::empty(),
            message_number: 0,
            io_buffer: Buffer::new(),
            transcript: Transcript::new(),
            name_cache: None,
        }
    }

    /// The active message sequence.
    ///
    /// Fails if the bitmask does not name a populated sequence; the
    /// resolver only ever produces catalogued combinations, so a miss is
    /// a state-machine bug surfacing as a protocol error.
    pub fn sequence(&self) -> Result<&'static [HandshakeMessage], TlsError> {
        message_sequence(self.handshake_type).ok_or(TlsError::BadMessage)
    }

    /// The message at the cursor.
    pub fn active_message(&self) -> Result<HandshakeMessage, TlsError> {
        self.sequence()?
            .get(self.message_number)
            .copied()
            .ok_or(TlsError::BadMessage)
    }

    /// Whether the handshake has reached application data.
    pub fn is_complete(&self) -> bool {
        matches!(
            self.active_message(),
            Ok(HandshakeMessage::ApplicationData)
        )
    }

    /// Cached human-readable name of the current handshake type.
    pub fn type_name(&mut self) -> &str {
        let current = self.handshake_type;
        if self
            .name_cache
            .as_ref()
            .map_or(true, |(cached, _)| *cached != current)
        {
            self.name_cache = Some((current, handshake_type_name(current)));
        }
        self.name_cache
            .as_ref()
            .map_or("INITIAL", |(_, name)| name.as_str())
    }
}

impl Default for HandshakeState {
    fn default() -> Self {
        Self::new()
    }
}
