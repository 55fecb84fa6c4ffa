//! The per-connection handshake object.
//!
//! `Connection` glues the drivers to their collaborators: the transport,
//! the per-message handlers, and the optional session store. The message
//! handlers see the connection through `HandshakeContext`, a view that
//! exposes the negotiation state but not the transport or the record
//! buffers.

use crate::config::{CertAuthType, Config};
use crate::handshake::{HandshakeMessage, HandshakeState, HandshakeType, MessageHandlers};
use crate::record::RecordIo;
use crate::session::{SessionInfo, SessionStore};
use crate::transport::Transport;
use crate::{Role, TlsError};

/// One TLS connection being negotiated.
pub struct Connection<T: Transport> {
    pub(crate) mode: Role,
    pub(crate) config: Config,
    pub(crate) handshake: HandshakeState,
    pub(crate) session: SessionInfo,
    pub(crate) record: RecordIo,
    pub(crate) transport: T,
    pub(crate) handlers: Box<dyn MessageHandlers>,
    pub(crate) store: Option<Box<dyn SessionStore>>,
    /// Whether this engine currently holds a cork on the transport.
    pub(crate) corked: bool,
    /// Set on fatal errors; the connection refuses further driving.
    pub(crate) closed: bool,
}

impl<T: Transport> Connection<T> {
    /// Create a client connection.
    pub fn client(transport: T, config: Config, handlers: Box<dyn MessageHandlers>) -> Self {
        Self::new(Role::Client, transport, config, handlers)
    }

    /// Create a server connection.
    pub fn server(transport: T, config: Config, handlers: Box<dyn MessageHandlers>) -> Self {
        Self::new(Role::Server, transport, config, handlers)
    }

    fn new(mode: Role, transport: T, config: Config, handlers: Box<dyn MessageHandlers>) -> Self {
        Self {
            mode,
            config,
            handshake: HandshakeState::new(),
            session: SessionInfo::new(),
            record: RecordIo::new(),
            transport,
            handlers,
            store: None,
            corked: false,
            closed: false,
        }
    }

    /// Attach a session cache and ticket key store.
    pub fn with_session_store(mut self, store: Box<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Endpoint role.
    pub fn mode(&self) -> Role {
        self.mode
    }

    /// The handshake state, for diagnostics and tests.
    pub fn handshake(&self) -> &HandshakeState {
        &self.handshake
    }

    /// The session negotiation state.
    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// Shape of the in-progress handshake.
    pub fn handshake_type(&self) -> HandshakeType {
        self.handshake.handshake_type
    }

    /// The logical message at the sequence cursor.
    pub fn current_message(&self) -> Result<HandshakeMessage, TlsError> {
        self.handshake.active_message()
    }

    /// Name of the message at the sequence cursor, for diagnostics.
    pub fn last_message_name(&self) -> &'static str {
        self.handshake
            .active_message()
            .map(|m| m.name())
            .unwrap_or("UNKNOWN")
    }

    /// Cached human-readable name of the handshake type.
    pub fn handshake_type_name(&mut self) -> &str {
        self.handshake.type_name()
    }

    /// Whether the handshake has reached application data.
    pub fn is_handshake_complete(&self) -> bool {
        self.handshake.is_complete()
    }

    /// Record that the client sent an empty certificate list.
    ///
    /// Only legal under the optional client-auth policy.
    pub fn set_no_client_cert(&mut self) -> Result<(), TlsError> {
        no_client_cert(&self.config, &mut self.handshake)
    }

    /// Run the handshake-type resolver; see
    /// [`HandshakeContext::set_handshake_type`].
    pub fn set_handshake_type(&mut self) -> Result<(), TlsError> {
        let store: Option<&mut dyn SessionStore> = match self.store.as_mut() {
            Some(b) => Some(&mut **b),
            None => None,
        };
        let mut ctx = HandshakeContext {
            mode: self.mode,
            config: &self.config,
            handshake: &mut self.handshake,
            session: &mut self.session,
            store,
        };
        ctx.set_handshake_type()
    }

    /// Invoke the handler for `msg` over the handshake context.
    pub(crate) fn dispatch(&mut self, msg: HandshakeMessage) -> Result<(), TlsError> {
        let store: Option<&mut dyn SessionStore> = match self.store.as_mut() {
            Some(b) => Some(&mut **b),
            None => None,
        };
        let mut ctx = HandshakeContext {
            mode: self.mode,
            config: &self.config,
            handshake: &mut self.handshake,
            session: &mut self.session,
            store,
        };
        self.handlers.handle(msg, &mut ctx)
    }
}

/// The connection as a message handler sees it.
///
/// Inbound, `handshake.io_buffer` holds exactly the message body;
/// outbound the handler appends the body to it. `handshake.transcript`
/// is pre-update: it covers every message before this one.
pub struct HandshakeContext<'a> {
    /// Our role.
    pub mode: Role,
    /// Connection configuration.
    pub config: &'a Config,
    /// Sequence cursor, message buffer, and transcript.
    pub handshake: &'a mut HandshakeState,
    /// Negotiation scratchpad.
    pub session: &'a mut SessionInfo,
    /// Session cache and ticket keys, when attached.
    pub store: Option<&'a mut dyn SessionStore>,
}

impl HandshakeContext<'_> {
    /// Record that the client sent an empty certificate list.
    pub fn set_no_client_cert(&mut self) -> Result<(), TlsError> {
        no_client_cert(self.config, self.handshake)
    }
}

fn no_client_cert(config: &Config, handshake: &mut HandshakeState) -> Result<(), TlsError> {
    if config.client_cert_auth != CertAuthType::Optional {
        return Err(TlsError::BadMessage);
    }
    handshake
        .handshake_type
        .insert(HandshakeType::NO_CLIENT_CERT);
    Ok(())
}
