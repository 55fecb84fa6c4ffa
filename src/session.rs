//! Per-connection session state and resumption interfaces.
//!
//! `SessionInfo` is the negotiation scratchpad the message handlers fill
//! in; the handshake-type resolver reads it to commit to a message
//! sequence. The session cache and ticket keys live behind the
//! `SessionStore` trait and are treated as opaque and internally safe.

use crate::cipher::{CipherSuite, HashAlgs};
use crate::transcript::HashRequirements;
use crate::{TlsError, TlsVersion};

/// Where this connection stands with session tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStatus {
    /// No ticket involved.
    NoTicket,
    /// The peer presented a ticket that still needs decrypting.
    DecryptTicket,
    /// A new ticket will be issued in this handshake.
    NewTicket,
}

/// Result of decrypting a presented session ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketOutcome {
    /// Ticket accepted; the session resumes.
    Resumed,
    /// Ticket accepted under a retiring key; resume and issue a fresh one.
    ResumedReissue,
    /// Ticket not usable; continue with a full handshake.
    NotResumed,
}

/// Narrow interface to the session cache and ticket key store.
///
/// The engine calls these at precisely defined points and assumes the
/// implementation is internally thread-safe.
pub trait SessionStore {
    /// Look up `session_id` and restore session state on a hit.
    fn resume_from_cache(&mut self, session_id: &[u8]) -> Result<bool, TlsError>;

    /// Drop any cache entry for `session_id`.
    fn cache_delete(&mut self, session_id: &[u8]);

    /// Attempt to decrypt a ticket presented by the peer.
    fn decrypt_session_ticket(&mut self, ticket: &[u8]) -> Result<TicketOutcome, TlsError>;

    /// Whether a key suitable for issuing new tickets is available.
    fn is_ticket_key_available(&self) -> bool;
}

/// Negotiation state shared between the drivers and the handlers.
#[derive(Debug)]
pub struct SessionInfo {
    /// Negotiated protocol version, once known.
    pub version: Option<TlsVersion>,
    /// Negotiated cipher suite, once known.
    pub cipher_suite: Option<CipherSuite>,
    /// Session ID: offered by the client, echoed or freshly generated by
    /// the server.
    pub session_id: Vec<u8>,
    /// Whether the session was resumed (ticket, cache hit, or observed by
    /// the client in `ServerHello`).
    pub resumed: bool,
    /// Session ticket progress.
    pub ticket_status: TicketStatus,
    /// Ticket presented by the client, awaiting decryption.
    pub client_ticket: Option<Vec<u8>>,
    /// The peer asked for a session ticket to be issued.
    pub ticket_requested: bool,
    /// An OCSP response will be (or was) stapled in this handshake.
    pub ocsp_status_pending: bool,
    /// Signature hashes the handlers still need out of the transcript.
    pub sig_hashes: HashAlgs,
    /// The initial `ClientHello` arrived in SSLv2 framing.
    pub sslv2: bool,
}

impl SessionInfo {
    /// Fresh, unnegotiated session state.
    pub fn new() -> Self {
        Self {
            version: None,
            cipher_suite: None,
            session_id: Vec::new(),
            resumed: false,
            ticket_status: TicketStatus::NoTicket,
            client_ticket: None,
            ticket_requested: false,
            ocsp_status_pending: false,
            sig_hashes: HashAlgs::empty(),
            sslv2: false,
        }
    }

    /// The transcript-hash requirements implied by the current state.
    pub fn hash_requirements(&self) -> HashRequirements {
        HashRequirements {
            version: self.version,
            prf: self.cipher_suite.map(|c| c.prf_hash()),
            sig_hashes: self.sig_hashes,
        }
    }
}

impl Default for SessionInfo {
    fn default() -> Self {
        Self::new()
    }
}
