//! TLS 1.0-1.2 handshake engine.
//!
//! This crate drives a peer, as client or server, through the RFC 5246
//! handshake over a byte-oriented and potentially non-blocking transport.
//! It owns the handshake state machine: which message sequence applies to
//! the negotiated parameters, per-message dispatch, expected-type
//! enforcement, the running transcript hashes used for `Finished`
//! verification, fragmentation of outgoing messages into records, and
//! reassembly of incoming messages that span records.
//!
//! # Architecture
//!
//! - `handshake`: message catalogue, sequence tables, and the I/O drivers
//! - `record`: record framing and the resumable record reader/writer
//! - `transcript`: multi-algorithm running handshake transcript
//! - `connection`: the per-connection object and handler interface
//! - `session`: session info and the resumption store interface
//! - `transport`: byte transport with socket coalescing hints
//!
//! Record-layer cryptography, per-message codecs, and certificate
//! validation are collaborators behind narrow interfaces; this crate
//! decides *when* they run, not *what* they do.

use core::fmt;
use std::io;

pub mod alert;
pub mod buffer;
pub mod cipher;
pub mod config;
pub mod connection;
pub mod handshake;
pub mod record;
pub mod session;
pub mod transcript;
pub mod transport;

pub use alert::AlertDescription;
pub use cipher::{CipherSuite, HashAlg};
pub use config::{CertAuthType, Config};
pub use connection::{Connection, HandshakeContext};
pub use handshake::{HandshakeMessage, HandshakeType, MessageHandlers};
pub use session::{SessionInfo, SessionStore, TicketOutcome, TicketStatus};
pub use transport::Transport;

/// TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    /// TLS 1.0.
    Tls10,
    /// TLS 1.1.
    Tls11,
    /// TLS 1.2.
    Tls12,
}

impl TlsVersion {
    /// Get the protocol version bytes.
    pub fn to_bytes(&self) -> [u8; 2] {
        match self {
            TlsVersion::Tls10 => [0x03, 0x01],
            TlsVersion::Tls11 => [0x03, 0x02],
            TlsVersion::Tls12 => [0x03, 0x03],
        }
    }

    /// Parse from bytes.
    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        match bytes {
            [0x03, 0x01] => Some(TlsVersion::Tls10),
            [0x03, 0x02] => Some(TlsVersion::Tls11),
            [0x03, 0x03] => Some(TlsVersion::Tls12),
            _ => None,
        }
    }
}

/// Endpoint role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Client endpoint.
    Client,
    /// Server endpoint.
    Server,
}

impl Role {
    /// Get the opposite role.
    pub fn peer(&self) -> Role {
        match self {
            Role::Client => Role::Server,
            Role::Server => Role::Client,
        }
    }
}

/// What the connection is waiting on when an operation could not complete.
///
/// A blocked operation leaves the connection in a consistent state; the
/// caller polls the transport for readiness and re-invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    /// Not blocked.
    NotBlocked,
    /// Blocked waiting for transport bytes.
    Read,
    /// Blocked waiting for transport writability.
    Write,
}

/// TLS handshake error types.
#[derive(Debug)]
pub enum TlsError {
    /// The transport could not make progress; retry after readiness.
    WouldBlock,
    /// Protocol violation: unexpected record or handshake message.
    BadMessage,
    /// A fatal alert was received from the peer.
    AlertReceived(AlertDescription),
    /// The peer closed the connection, or the connection was killed.
    ConnectionClosed,
    /// Handshake could not be completed.
    HandshakeFailure,
    /// Cipher suite not supported.
    UnsupportedCipherSuite,
    /// Transport I/O error.
    Io(io::Error),
}

impl TlsError {
    /// Whether the caller may retry the operation after transport readiness.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TlsError::WouldBlock)
    }
}

impl fmt::Display for TlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlsError::WouldBlock => write!(f, "Operation would block"),
            TlsError::BadMessage => write!(f, "Unexpected handshake message"),
            TlsError::AlertReceived(desc) => write!(f, "Alert received: {:?}", desc),
            TlsError::ConnectionClosed => write!(f, "Connection closed"),
            TlsError::HandshakeFailure => write!(f, "Handshake failure"),
            TlsError::UnsupportedCipherSuite => write!(f, "Unsupported cipher suite"),
            TlsError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TlsError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TlsError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted => TlsError::WouldBlock,
            io::ErrorKind::UnexpectedEof => TlsError::ConnectionClosed,
            _ => TlsError::Io(e),
        }
    }
}
