//! Logical handshake messages and their static wire properties.

use crate::record::RecordType;
use crate::Role;

/// Wire handshake message types (RFC 5246 §7.4).
pub mod wire {
    pub const HELLO_REQUEST: u8 = 0;
    pub const CLIENT_HELLO: u8 = 1;
    pub const SERVER_HELLO: u8 = 2;
    pub const NEW_SESSION_TICKET: u8 = 4;
    pub const CERTIFICATE: u8 = 11;
    pub const SERVER_KEY_EXCHANGE: u8 = 12;
    pub const CERTIFICATE_REQUEST: u8 = 13;
    pub const SERVER_HELLO_DONE: u8 = 14;
    pub const CERTIFICATE_VERIFY: u8 = 15;
    pub const CLIENT_KEY_EXCHANGE: u8 = 16;
    pub const FINISHED: u8 = 20;
    pub const CERTIFICATE_STATUS: u8 = 22;
}

/// Which peer writes a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    /// Written by the client.
    Client,
    /// Written by the server.
    Server,
    /// Sentinel for application data: both peers may write.
    Both,
}

impl From<Role> for Writer {
    fn from(role: Role) -> Self {
        match role {
            Role::Client => Writer::Client,
            Role::Server => Writer::Server,
        }
    }
}

/// A logical message in the handshake sequence.
///
/// Distinct from the wire message type: the same wire type can appear for
/// both peers (`Certificate`, `Finished`), while a logical message names
/// one step of one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeMessage {
    ClientHello,
    ServerHello,
    ServerNewSessionTicket,
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
}

/// Static properties of one logical message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageAction {
    /// Record type the message travels in.
    pub record_type: RecordType,
    /// Wire handshake message type; `None` outside handshake records.
    pub message_type: Option<u8>,
    /// Which peer writes it; the other decodes.
    pub writer: Writer,
}

impl HandshakeMessage {
    /// Static action for this message.
    pub const fn action(self) -> MessageAction {
        use HandshakeMessage::*;
        match self {
            ClientHello => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::CLIENT_HELLO),
                writer: Writer::Client,
            },
            ServerHello => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::SERVER_HELLO),
                writer: Writer::Server,
            },
            ServerNewSessionTicket => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::NEW_SESSION_TICKET),
                writer: Writer::Server,
            },
            ServerCert => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::CERTIFICATE),
                writer: Writer::Server,
            },
            ServerCertStatus => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::CERTIFICATE_STATUS),
                writer: Writer::Server,
            },
            ServerKey => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::SERVER_KEY_EXCHANGE),
                writer: Writer::Server,
            },
            ServerCertReq => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::CERTIFICATE_REQUEST),
                writer: Writer::Server,
            },
            ServerHelloDone => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::SERVER_HELLO_DONE),
                writer: Writer::Server,
            },
            ClientCert => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::CERTIFICATE),
                writer: Writer::Client,
            },
            ClientKey => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::CLIENT_KEY_EXCHANGE),
                writer: Writer::Client,
            },
            ClientCertVerify => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::CERTIFICATE_VERIFY),
                writer: Writer::Client,
            },
            ClientChangeCipherSpec => MessageAction {
                record_type: RecordType::ChangeCipherSpec,
                message_type: None,
                writer: Writer::Client,
            },
            ClientFinished => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::FINISHED),
                writer: Writer::Client,
            },
            ServerChangeCipherSpec => MessageAction {
                record_type: RecordType::ChangeCipherSpec,
                message_type: None,
                writer: Writer::Server,
            },
            ServerFinished => MessageAction {
                record_type: RecordType::Handshake,
                message_type: Some(wire::FINISHED),
                writer: Writer::Server,
            },
            ApplicationData => MessageAction {
                record_type: RecordType::ApplicationData,
                message_type: None,
                writer: Writer::Both,
            },
        }
    }

    /// Canonical name for diagnostics.
    pub const fn name(self) -> &'static str {
        use HandshakeMessage::*;
        match self {
            ClientHello => "CLIENT_HELLO",
            ServerHello => "SERVER_HELLO",
            ServerNewSessionTicket => "SERVER_NEW_SESSION_TICKET",
            ServerCert => "SERVER_CERT",
            ServerCertStatus => "SERVER_CERT_STATUS",
            ServerKey => "SERVER_KEY",
            ServerCertReq => "SERVER_CERT_REQ",
            ServerHelloDone => "SERVER_HELLO_DONE",
            ClientCert => "CLIENT_CERT",
            ClientKey => "CLIENT_KEY",
            ClientCertVerify => "CLIENT_CERT_VERIFY",
            ClientChangeCipherSpec => "CLIENT_CHANGE_CIPHER_SPEC",
            ClientFinished => "CLIENT_FINISHED",
            ServerChangeCipherSpec => "SERVER_CHANGE_CIPHER_SPEC",
            ServerFinished => "SERVER_FINISHED",
            ApplicationData => "APPLICATION_DATA",
        }
    }

    /// All logical messages, for table verification.
    pub const ALL: [HandshakeMessage; 16] = [
        HandshakeMessage::ClientHello,
        HandshakeMessage::ServerHello,
        HandshakeMessage::ServerNewSessionTicket,
        HandshakeMessage::ServerCert,
        HandshakeMessage::ServerCertStatus,
        HandshakeMessage::ServerKey,
        HandshakeMessage::ServerCertReq,
        HandshakeMessage::ServerHelloDone,
        HandshakeMessage::ClientCert,
        HandshakeMessage::ClientKey,
        HandshakeMessage::ClientCertVerify,
        HandshakeMessage::ClientChangeCipherSpec,
        HandshakeMessage::ClientFinished,
        HandshakeMessage::ServerChangeCipherSpec,
        HandshakeMessage::ServerFinished,
        HandshakeMessage::ApplicationData,
    ];
}
