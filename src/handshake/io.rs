//! Handshake I/O drivers.
//!
//! Three layers, bottom up: the inbound driver reads and classifies one
//! record at a time, reassembling handshake messages that span records;
//! the outbound driver serializes one message and fragments it into
//! records; the negotiate loop alternates the two based on whose turn it
//! is to write. Every suspension point surfaces as `WouldBlock` with the
//! cursor state preserved, so the caller can re-invoke after transport
//! readiness.

use log::{debug, trace};
use rand::RngCore;

use super::message::{wire, HandshakeMessage, Writer};
use super::sequence::HandshakeType;
use super::MAX_HANDSHAKE_MESSAGE_LENGTH;
use crate::alert;
use crate::config::CertAuthType;
use crate::connection::{Connection, HandshakeContext};
use crate::record::RecordType;
use crate::session::{TicketOutcome, TicketStatus};
use crate::transport::Transport;
use crate::{Blocked, Role, TlsError};

impl<T: Transport> Connection<T> {
    /// Drive the handshake until completion, suspension, or error.
    ///
    /// On `WouldBlock`, `blocked` says which direction stalled; the
    /// caller polls for readiness and re-invokes with the same
    /// connection. Any other error is fatal to the connection, and when a
    /// session ID has been issued under an active cache, the cache entry
    /// is deleted before the error surfaces.
    pub fn negotiate(&mut self, blocked: &mut Blocked) -> Result<(), TlsError> {
        if self.closed {
            return Err(TlsError::ConnectionClosed);
        }

        loop {
            // Pending bytes from an interrupted flush go out first.
            *blocked = Blocked::Write;
            self.flush_transport()?;

            let msg = match self.handshake.active_message() {
                Ok(m) => m,
                Err(e) => return Err(self.kill(e)),
            };
            if msg == HandshakeMessage::ApplicationData {
                break;
            }

            if msg.action().writer == Writer::from(self.mode) {
                *blocked = Blocked::Write;
                if let Err(err) = self.write_message() {
                    if err.is_retryable() {
                        return Err(err);
                    }
                    // The peer may have already told us what went wrong;
                    // its alert beats our local write error.
                    let err = match self.read_record() {
                        Err(alert @ TlsError::AlertReceived(_)) => alert,
                        _ => err,
                    };
                    return Err(self.kill(err));
                }
            } else {
                *blocked = Blocked::Read;
                if let Err(err) = self.read_record() {
                    if err.is_retryable() {
                        return Err(err);
                    }
                    return Err(self.kill(err));
                }
            }
        }

        *blocked = Blocked::NotBlocked;
        // The handshake is frozen; drop the reassembly allocation.
        self.handshake.io_buffer.release();
        Ok(())
    }

    /// Mark the connection dead and invalidate any cached session.
    fn kill(&mut self, err: TlsError) -> TlsError {
        self.closed = true;
        if self.config.use_session_cache && !self.session.session_id.is_empty() {
            if let Some(store) = self.store.as_deref_mut() {
                debug!(
                    "handshake failed, deleting cached session {}",
                    hex::encode(&self.session.session_id)
                );
                store.cache_delete(&self.session.session_id);
            }
        }
        err
    }

    fn flush_transport(&mut self) -> Result<(), TlsError> {
        self.record.flush(&mut self.transport)
    }

    /// Write exactly one handshake message, fragmenting across records.
    ///
    /// The handler runs at most once per message: a non-wiped buffer
    /// means a previous call already encoded it and we are resuming an
    /// interrupted flush.
    fn write_message(&mut self) -> Result<(), TlsError> {
        let msg = self.handshake.active_message()?;
        let action = msg.action();

        if self.handshake.io_buffer.is_wiped() {
            match action.record_type {
                RecordType::Handshake => {
                    let wire_type = action.message_type.ok_or(TlsError::BadMessage)?;
                    // Placeholder length, back-patched after the handler
                    // has appended the body.
                    self.handshake.io_buffer.write(&[wire_type, 0, 0, 0]);
                    self.dispatch(msg)?;
                    let body_len = self.handshake.io_buffer.len() - 4;
                    if body_len > MAX_HANDSHAKE_MESSAGE_LENGTH {
                        return Err(TlsError::BadMessage);
                    }
                    self.handshake.io_buffer.overwrite(
                        1,
                        &[(body_len >> 16) as u8, (body_len >> 8) as u8, body_len as u8],
                    );
                }
                RecordType::ChangeCipherSpec => {
                    self.dispatch(msg)?;
                }
                _ => return Err(TlsError::BadMessage),
            }
            trace!("sending {}", msg.name());
        }

        let version = self.record_version();
        let max_payload = self.config.fragment_length;
        let reqs = self.session.hash_requirements();
        while self.handshake.io_buffer.remaining() > 0 {
            let n = max_payload.min(self.handshake.io_buffer.remaining());
            let frag = self.handshake.io_buffer.take(n);
            self.record.write_record(action.record_type, version, frag);
            // The transcript sees exactly what the wire carries, fragment
            // by fragment, after the handler produced the bytes.
            if action.record_type == RecordType::Handshake {
                self.handshake.transcript.update(&reqs, frag);
            }
            self.flush_transport()?;
        }

        self.handshake.io_buffer.wipe();
        self.advance_message()
    }

    /// Read and process exactly one record.
    fn read_record(&mut self) -> Result<(), TlsError> {
        let expecting_client_hello = matches!(
            self.handshake.active_message()?,
            HandshakeMessage::ClientHello
        );
        let (type_byte, sslv2) = self
            .record
            .read_full_record(&mut self.transport, expecting_client_hello)?;

        if sslv2 {
            return self.read_sslv2_client_hello();
        }

        match RecordType::from_byte(type_byte) {
            // Renegotiation is unsupported; mid-handshake application
            // data has no legal meaning.
            Some(RecordType::ApplicationData) => Err(TlsError::BadMessage),
            Some(RecordType::ChangeCipherSpec) => self.read_change_cipher_spec(),
            Some(RecordType::Alert) => {
                let result = alert::process(self.record.in_frag.peek());
                self.record.consume();
                result
            }
            Some(RecordType::Handshake) => {
                self.read_handshake_record()?;
                self.record.consume();
                Ok(())
            }
            None => {
                // Heartbeat and anything else unknown.
                trace!("ignoring record of type {}", type_byte);
                self.record.consume();
                Ok(())
            }
        }
    }

    /// Process an SSLv2-format initial `ClientHello`.
    ///
    /// The transcript receives a TLS-shaped canonicalization: the message
    /// type and client version bytes from the legacy header, then the
    /// record body. Unlike the TLS path, hashing happens before the
    /// conversion handler runs.
    fn read_sslv2_client_hello(&mut self) -> Result<(), TlsError> {
        let msg = self.handshake.active_message()?;
        if msg != HandshakeMessage::ClientHello {
            return Err(TlsError::BadMessage);
        }
        debug!("processing SSLv2-format client hello");
        self.session.sslv2 = true;

        let reqs = self.session.hash_requirements();
        self.handshake
            .transcript
            .update(&reqs, self.record.sslv2_header_canon());
        self.handshake
            .transcript
            .update(&reqs, self.record.in_frag.peek());

        self.handshake.io_buffer.write(self.record.in_frag.peek());
        self.dispatch(msg)?;

        self.handshake.io_buffer.wipe();
        self.advance_message()?;
        self.record.consume();
        Ok(())
    }

    /// Process a `ChangeCipherSpec` record: exactly one body byte, and
    /// the cursor must be sitting on the peer's CCS message.
    fn read_change_cipher_spec(&mut self) -> Result<(), TlsError> {
        if self.record.in_frag.remaining() != 1 {
            return Err(TlsError::BadMessage);
        }
        let msg = self.handshake.active_message()?;
        let action = msg.action();
        if action.record_type != RecordType::ChangeCipherSpec
            || action.writer != Writer::from(self.mode.peer())
        {
            return Err(TlsError::BadMessage);
        }

        let body = self.record.in_frag.peek()[0];
        self.record.in_frag.skip(1);
        self.handshake.io_buffer.write_u8(body);
        self.dispatch(msg)?;

        self.handshake.io_buffer.wipe();
        self.advance_message()?;
        self.record.consume();
        Ok(())
    }

    /// Drain a handshake record, dispatching every message that
    /// completes within it.
    ///
    /// A message may end mid-record (the loop continues with the next
    /// one) or extend past the record's end (the partial bytes stay in
    /// `io_buffer` and the caller reads another record).
    fn read_handshake_record(&mut self) -> Result<(), TlsError> {
        while self.record.in_frag.remaining() > 0 {
            // Reassemble the four-byte message header.
            if self.handshake.io_buffer.len() < 4 {
                let need = 4 - self.handshake.io_buffer.len();
                let got = self.record.in_frag.take(need);
                self.handshake.io_buffer.write(got);
                if self.handshake.io_buffer.len() < 4 {
                    break;
                }
            }

            let header = self.handshake.io_buffer.bytes();
            let wire_type = header[0];
            let declared_len = ((header[1] as usize) << 16)
                | ((header[2] as usize) << 8)
                | header[3] as usize;
            if declared_len > MAX_HANDSHAKE_MESSAGE_LENGTH {
                return Err(TlsError::BadMessage);
            }

            // Pull the body, as much as this record still holds.
            let body_have = self.handshake.io_buffer.len() - 4;
            if body_have < declared_len {
                let want = declared_len - body_have;
                let got = self.record.in_frag.take(want);
                self.handshake.io_buffer.write(got);
                if self.handshake.io_buffer.len() - 4 < declared_len {
                    break;
                }
            }

            self.adjust_sequence(wire_type)?;

            let msg = self.handshake.active_message()?;
            let action = msg.action();
            if action.record_type != RecordType::Handshake
                || action.message_type != Some(wire_type)
                || action.writer != Writer::from(self.mode.peer())
            {
                debug!(
                    "expected {} but peer sent handshake message type {}",
                    msg.name(),
                    wire_type
                );
                return Err(TlsError::BadMessage);
            }
            trace!("received {}", msg.name());

            // The handler reads the body and may read the transcript in
            // its pre-update state; hashing strictly follows it.
            self.handshake.io_buffer.skip(4);
            self.dispatch(msg)?;

            let reqs = self.session.hash_requirements();
            self.handshake
                .transcript
                .update(&reqs, self.handshake.io_buffer.bytes());

            self.handshake.io_buffer.wipe();
            self.advance_message()?;
        }
        Ok(())
    }

    /// Mid-flight sequence adjustments observed by a client.
    ///
    /// Both re-anchor transparently: the arriving message sits at the
    /// current cursor position in the adjusted sequence, so the ordinal
    /// does not move.
    fn adjust_sequence(&mut self, wire_type: u8) -> Result<(), TlsError> {
        if self.mode != Role::Client {
            return Ok(());
        }

        // The server advertised a stapled response but skipped it.
        if self.handshake.active_message()? == HandshakeMessage::ServerCertStatus
            && wire_type != wire::CERTIFICATE_STATUS
        {
            self.handshake
                .handshake_type
                .remove(HandshakeType::OCSP_STATUS);
            debug!("server omitted its certificate status message");
        }

        // The server requests a certificate we only optionally expected.
        if self.handshake.active_message()? == HandshakeMessage::ServerHelloDone
            && wire_type == wire::CERTIFICATE_REQUEST
            && self.config.client_cert_auth == CertAuthType::Optional
        {
            self.handshake
                .handshake_type
                .insert(HandshakeType::CLIENT_AUTH);
            debug!("server requests optional client authentication");
        }

        Ok(())
    }

    /// Advance the sequence cursor and apply the corking policy.
    fn advance_message(&mut self) -> Result<(), TlsError> {
        let was_writer = self.handshake.active_message()?.action().writer;
        self.handshake.message_number += 1;
        let now_writer = self.handshake.active_message()?.action().writer;

        // Delayed ACKs only add round trips while handshaking.
        self.transport.quickack();

        if !self.config.managed_corking || was_writer == now_writer {
            return Ok(());
        }
        if now_writer == Writer::from(self.mode) {
            // Our flight begins: coalesce the small messages.
            self.transport.cork();
            self.corked = true;
        } else {
            // We become the reader, or the handshake is over.
            self.transport.uncork();
            self.corked = false;
        }
        Ok(())
    }

    /// Version bytes stamped on outgoing records.
    fn record_version(&self) -> [u8; 2] {
        self.session
            .version
            .map(|v| v.to_bytes())
            .unwrap_or([0x03, 0x03])
    }
}

impl HandshakeContext<'_> {
    /// The handshake-type resolver.
    ///
    /// Invoked by the server after processing `ClientHello` and by the
    /// client after processing `ServerHello`, once enough is known to
    /// commit to a message sequence.
    pub fn set_handshake_type(&mut self) -> Result<(), TlsError> {
        let mut handshake_type = HandshakeType::NEGOTIATED;
        let mut skip_cache_lookup = false;

        if self.config.use_tickets {
            if self.session.ticket_status == TicketStatus::DecryptTicket {
                // Whatever the decrypt outcome, ticket processing settles
                // resumption; the session cache is not consulted.
                skip_cache_lookup = true;
                let ticket = self.session.client_ticket.take().unwrap_or_default();
                if let Some(store) = self.store.as_deref_mut() {
                    match store.decrypt_session_ticket(&ticket)? {
                        TicketOutcome::Resumed => self.session.resumed = true,
                        TicketOutcome::ResumedReissue => {
                            self.session.resumed = true;
                            self.session.ticket_status = TicketStatus::NewTicket;
                        }
                        TicketOutcome::NotResumed => {}
                    }
                }
            }

            let will_issue = self.session.ticket_status == TicketStatus::NewTicket
                || (!self.session.resumed
                    && self.mode == Role::Server
                    && self.session.ticket_requested
                    && self
                        .store
                        .as_deref()
                        .map_or(false, |s| s.is_ticket_key_available()));
            if will_issue {
                handshake_type |= HandshakeType::WITH_SESSION_TICKET;
                self.session.ticket_status = TicketStatus::NewTicket;
            }
        }

        // Resumed via ticket, or a client that saw its session echoed.
        if self.session.resumed {
            return Ok(self.commit(handshake_type));
        }

        if !skip_cache_lookup
            && self.mode == Role::Server
            && self.config.use_session_cache
            && !self.session.session_id.is_empty()
        {
            if let Some(store) = self.store.as_deref_mut() {
                if store.resume_from_cache(&self.session.session_id)? {
                    self.session.resumed = true;
                    return Ok(self.commit(handshake_type));
                }
            }
        }

        // Full handshake from here.
        handshake_type |= HandshakeType::FULL_HANDSHAKE;

        if self.mode == Role::Server {
            // Fresh session ID so the completed session is cacheable.
            let mut session_id = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut session_id);
            self.session.session_id = session_id.to_vec();
        }

        let client_auth = match self.mode {
            Role::Client => self.config.client_cert_auth == CertAuthType::Required,
            Role::Server => matches!(
                self.config.client_cert_auth,
                CertAuthType::Required | CertAuthType::Optional
            ),
        };
        if client_auth {
            handshake_type |= HandshakeType::CLIENT_AUTH;
        }

        if self
            .session
            .cipher_suite
            .map_or(false, |c| c.key_exchange().is_ephemeral())
        {
            handshake_type |= HandshakeType::PERFECT_FORWARD_SECRECY;
        }

        if self.session.ocsp_status_pending {
            handshake_type |= HandshakeType::OCSP_STATUS;
        }

        Ok(self.commit(handshake_type))
    }

    fn commit(&mut self, handshake_type: HandshakeType) {
        self.handshake.handshake_type = handshake_type;
        debug!("handshake type is {}", self.handshake.type_name());
    }
}
