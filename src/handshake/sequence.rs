//! Handshake-type bitmask and the message-sequence catalogue.
//!
//! The bitmask describes the shape of the in-progress handshake; the
//! catalogue maps each valid bitmask to the ordered sequence of logical
//! messages expected on the wire. The catalogue is written out in full:
//! the set of valid sequences is the protocol's ground truth, and a test
//! regenerates it from the ordering rules to prove the two agree.

use bitflags::bitflags;

use super::message::HandshakeMessage::{self, *};

bitflags! {
    /// Shape of the in-progress handshake.
    ///
    /// The empty value is the initial state, before the resolver has
    /// committed to a sequence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HandshakeType: u8 {
        /// Hello exchange is done and parameters are committed.
        const NEGOTIATED = 0x01;
        /// Not resumed; a fresh key exchange happens.
        const FULL_HANDSHAKE = 0x02;
        /// Ephemeral key exchange.
        const PERFECT_FORWARD_SECRECY = 0x04;
        /// A stapled OCSP response is part of the server flight.
        const OCSP_STATUS = 0x08;
        /// The server requests a client certificate.
        const CLIENT_AUTH = 0x10;
        /// Client auth was optional and the client sent an empty list.
        const NO_CLIENT_CERT = 0x20;
        /// A new session ticket will be issued.
        const WITH_SESSION_TICKET = 0x40;
    }
}

const NEG: u8 = HandshakeType::NEGOTIATED.bits();
const FULL: u8 = HandshakeType::FULL_HANDSHAKE.bits();
const PFS: u8 = HandshakeType::PERFECT_FORWARD_SECRECY.bits();
const OCSP: u8 = HandshakeType::OCSP_STATUS.bits();
const AUTH: u8 = HandshakeType::CLIENT_AUTH.bits();
const NO_CERT: u8 = HandshakeType::NO_CLIENT_CERT.bits();
const TICKET: u8 = HandshakeType::WITH_SESSION_TICKET.bits();

/// The sequence catalogue: every populated bitmask, in full.
///
/// The domain is the 128 flag combinations; only these entries are valid
/// and lookups of any other combination fail.
pub const SEQUENCES: &[(u8, &[HandshakeMessage])] = &[
    // Before the resolver has run.
    (0, &[ClientHello, ServerHello]),
    // Resumption.
    (
        NEG,
        &[
            ClientHello,
            ServerHello,
            ServerChangeCipherSpec,
            ServerFinished,
            ClientChangeCipherSpec,
            ClientFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ClientChangeCipherSpec,
            ClientFinished,
            ApplicationData,
        ],
    ),
    // Full handshake, no client auth.
    (
        NEG | FULL,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | OCSP,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | OCSP | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | PFS,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerKey,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | PFS | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerKey,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | PFS | OCSP,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerKey,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | PFS | OCSP | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerKey,
            ServerHelloDone,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    // Full handshake, client auth, certificate expected.
    (
        NEG | FULL | AUTH,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | OCSP,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | OCSP | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | PFS,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | PFS | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | PFS | OCSP,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | PFS | OCSP | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientCertVerify,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    // Full handshake, client auth, empty client certificate.
    (
        NEG | FULL | AUTH | NO_CERT,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | NO_CERT | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | NO_CERT | OCSP,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | NO_CERT | OCSP | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | NO_CERT | PFS,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | NO_CERT | PFS | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | NO_CERT | PFS | OCSP,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
    (
        NEG | FULL | AUTH | NO_CERT | PFS | OCSP | TICKET,
        &[
            ClientHello,
            ServerHello,
            ServerCert,
            ServerCertStatus,
            ServerKey,
            ServerCertReq,
            ServerHelloDone,
            ClientCert,
            ClientKey,
            ClientChangeCipherSpec,
            ClientFinished,
            ServerNewSessionTicket,
            ServerChangeCipherSpec,
            ServerFinished,
            ApplicationData,
        ],
    ),
];

/// Sequence of logical messages for a handshake type.
///
/// `None` for the unpopulated combinations; callers treat that as a
/// protocol violation rather than indexing a hole.
pub fn message_sequence(handshake_type: HandshakeType) -> Option<&'static [HandshakeMessage]> {
    SEQUENCES
        .iter()
        .find(|(bits, _)| *bits == handshake_type.bits())
        .map(|(_, seq)| *seq)
}

/// Human-readable name: flag names joined by `|`, `INITIAL` when empty.
pub fn handshake_type_name(handshake_type: HandshakeType) -> String {
    if handshake_type.is_empty() {
        return "INITIAL".to_string();
    }
    handshake_type
        .iter_names()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join("|")
}
