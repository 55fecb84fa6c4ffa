//! End-to-end handshake scenarios over paired in-memory connections.
//!
//! Two engines, one as client and one as server, are wired through byte
//! queues pumped by the test harness. Scripted handlers encode small
//! structured bodies so the resolver sees realistic negotiation inputs;
//! the `Finished` and `CertificateVerify` handlers verify transcript
//! digests for real, so a transcript divergence fails the handshake just
//! as it would in production.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use tls_handshake::cipher::HashAlgs;
use tls_handshake::handshake::Writer;
use tls_handshake::transcript::{HashRequirements, Transcript};
use tls_handshake::{
    AlertDescription, Blocked, CertAuthType, CipherSuite, Config, Connection, HandshakeContext,
    HandshakeMessage, HandshakeType, HashAlg, MessageHandlers, Role, SessionStore, TicketOutcome,
    TicketStatus, TlsError, Transport,
};

type Queue = Rc<RefCell<VecDeque<u8>>>;
type Events = Rc<RefCell<Vec<(Role, &'static str)>>>;
type CorkLog = Rc<RefCell<Vec<&'static str>>>;

fn queue() -> Queue {
    Rc::new(RefCell::new(VecDeque::new()))
}

/// One endpoint's transport: private in/out queues, pumped by the harness.
struct Pipe {
    rx: Queue,
    tx: Queue,
    cork_log: CorkLog,
    write_fail: Rc<RefCell<bool>>,
}

impl Read for Pipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut rx = self.rx.borrow_mut();
        if rx.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = buf.len().min(rx.len());
        for b in buf.iter_mut().take(n) {
            *b = rx.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for Pipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if *self.write_fail.borrow() {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        self.tx.borrow_mut().extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for Pipe {
    fn cork(&mut self) {
        self.cork_log.borrow_mut().push("cork");
    }

    fn uncork(&mut self) {
        self.cork_log.borrow_mut().push("uncork");
    }

    fn quickack(&mut self) {
        self.cork_log.borrow_mut().push("quickack");
    }
}

/// Shared session cache / ticket key store.
#[derive(Clone)]
struct SharedStore(Rc<RefCell<StoreState>>);

#[derive(Default)]
struct StoreState {
    cache_hit: bool,
    ticket_outcome: Option<TicketOutcome>,
    key_available: bool,
    resumes: Vec<Vec<u8>>,
    deletes: Vec<Vec<u8>>,
}

impl SharedStore {
    fn new() -> Self {
        SharedStore(Rc::new(RefCell::new(StoreState::default())))
    }
}

impl SessionStore for SharedStore {
    fn resume_from_cache(&mut self, session_id: &[u8]) -> Result<bool, TlsError> {
        let mut state = self.0.borrow_mut();
        state.resumes.push(session_id.to_vec());
        Ok(state.cache_hit)
    }

    fn cache_delete(&mut self, session_id: &[u8]) {
        self.0.borrow_mut().deletes.push(session_id.to_vec());
    }

    fn decrypt_session_ticket(&mut self, _ticket: &[u8]) -> Result<TicketOutcome, TlsError> {
        Ok(self
            .0
            .borrow()
            .ticket_outcome
            .unwrap_or(TicketOutcome::NotResumed))
    }

    fn is_ticket_key_available(&self) -> bool {
        self.0.borrow().key_available
    }
}

/// Per-endpoint scripting knobs.
#[derive(Clone)]
struct Knobs {
    cipher: CipherSuite,
    offer_session_id: Vec<u8>,
    client_offer_ticket: Option<Vec<u8>>,
    client_request_ticket: bool,
    client_request_ocsp: bool,
    client_expect_ocsp: bool,
    server_send_ocsp: bool,
    empty_client_cert: bool,
    fail_on: Option<&'static str>,
}

impl Default for Knobs {
    fn default() -> Self {
        Self {
            cipher: CipherSuite::EcdheRsaAes128GcmSha256,
            offer_session_id: Vec::new(),
            client_offer_ticket: None,
            client_request_ticket: false,
            client_request_ocsp: false,
            client_expect_ocsp: false,
            server_send_ocsp: false,
            empty_client_cert: false,
            fail_on: None,
        }
    }
}

/// Scripted message handlers encoding small structured bodies.
struct TestHandlers {
    knobs: Knobs,
    events: Events,
}

impl TestHandlers {
    fn prf(ctx: &HandshakeContext<'_>) -> HashAlg {
        ctx.session
            .cipher_suite
            .map(|c| c.prf_hash())
            .unwrap_or(HashAlg::Sha256)
    }
}

impl MessageHandlers for TestHandlers {
    fn handle(
        &mut self,
        msg: HandshakeMessage,
        ctx: &mut HandshakeContext<'_>,
    ) -> Result<(), TlsError> {
        use HandshakeMessage::*;

        let outbound = msg.action().writer == Writer::from(ctx.mode);
        self.events.borrow_mut().push((ctx.mode, msg.name()));

        if !outbound && self.knobs.fail_on == Some(msg.name()) {
            return Err(TlsError::HandshakeFailure);
        }

        match msg {
            ClientHello if outbound => {
                let k = &self.knobs;
                let mut body = vec![k.offer_session_id.len() as u8];
                body.extend_from_slice(&k.offer_session_id);
                if let Some(ticket) = &k.client_offer_ticket {
                    body.push(2);
                    body.push(ticket.len() as u8);
                    body.extend_from_slice(ticket);
                } else if k.client_request_ticket {
                    body.push(1);
                } else {
                    body.push(0);
                }
                body.push(k.client_request_ocsp as u8);
                ctx.handshake.io_buffer.write(&body);
                Ok(())
            }
            ClientHello => {
                ctx.session.version = Some(tls_handshake::TlsVersion::Tls12);
                ctx.session.cipher_suite = Some(self.knobs.cipher);
                if !ctx.session.sslv2 {
                    let body = ctx.handshake.io_buffer.peek().to_vec();
                    let sid_len = body[0] as usize;
                    ctx.session.session_id = body[1..1 + sid_len].to_vec();
                    let mut i = 1 + sid_len;
                    match body[i] {
                        1 => {
                            ctx.session.ticket_requested = true;
                            i += 1;
                        }
                        2 => {
                            ctx.session.ticket_requested = true;
                            let ticket_len = body[i + 1] as usize;
                            ctx.session.client_ticket =
                                Some(body[i + 2..i + 2 + ticket_len].to_vec());
                            ctx.session.ticket_status = TicketStatus::DecryptTicket;
                            i += 2 + ticket_len;
                        }
                        _ => i += 1,
                    }
                    let ocsp_requested = body[i] == 1;
                    ctx.session.ocsp_status_pending =
                        ocsp_requested && self.knobs.server_send_ocsp;
                }
                ctx.set_handshake_type()
            }
            ServerHello if outbound => {
                let mut body = vec![
                    ctx.session.resumed as u8,
                    ctx.session.session_id.len() as u8,
                ];
                body.extend_from_slice(&ctx.session.session_id);
                let cipher = ctx.session.cipher_suite.unwrap();
                body.extend_from_slice(&cipher.to_id().to_be_bytes());
                body.push((ctx.session.ticket_status == TicketStatus::NewTicket) as u8);
                body.push(ctx.session.ocsp_status_pending as u8);
                ctx.handshake.io_buffer.write(&body);
                Ok(())
            }
            ServerHello => {
                let body = ctx.handshake.io_buffer.peek().to_vec();
                ctx.session.version = Some(tls_handshake::TlsVersion::Tls12);
                ctx.session.resumed = body[0] == 1;
                let sid_len = body[1] as usize;
                ctx.session.session_id = body[2..2 + sid_len].to_vec();
                let mut i = 2 + sid_len;
                let cipher_id = u16::from_be_bytes([body[i], body[i + 1]]);
                i += 2;
                ctx.session.cipher_suite = Some(
                    CipherSuite::from_id(cipher_id).ok_or(TlsError::UnsupportedCipherSuite)?,
                );
                if body[i] == 1 {
                    ctx.session.ticket_status = TicketStatus::NewTicket;
                }
                i += 1;
                ctx.session.ocsp_status_pending =
                    body[i] == 1 || self.knobs.client_expect_ocsp;
                ctx.set_handshake_type()
            }
            ServerCert | ServerCertStatus | ServerKey | ServerCertReq | ServerNewSessionTicket
                if outbound =>
            {
                ctx.handshake.io_buffer.write(&[0xAB; 12]);
                Ok(())
            }
            ClientCert if outbound => {
                if self.knobs.empty_client_cert {
                    ctx.handshake.io_buffer.write(&[0, 0, 0]);
                    ctx.set_no_client_cert()
                } else {
                    ctx.handshake.io_buffer.write(&[0, 0, 5, 1, 2, 3, 4, 5]);
                    Ok(())
                }
            }
            ClientCert => {
                if ctx.handshake.io_buffer.peek() == [0, 0, 0] {
                    ctx.set_no_client_cert()
                } else {
                    Ok(())
                }
            }
            ClientKey if outbound => {
                ctx.handshake.io_buffer.write(&[0xC1; 32]);
                Ok(())
            }
            ClientCertVerify if outbound => {
                // Signs the transcript up to, but not including, itself.
                let digest = ctx.handshake.transcript.digest(Self::prf(ctx));
                ctx.handshake.io_buffer.write(&digest);
                Ok(())
            }
            ClientCertVerify => {
                let digest = ctx.handshake.transcript.digest(Self::prf(ctx));
                if ctx.handshake.io_buffer.peek() != digest.as_slice() {
                    return Err(TlsError::HandshakeFailure);
                }
                Ok(())
            }
            ClientChangeCipherSpec | ServerChangeCipherSpec if outbound => {
                ctx.handshake.io_buffer.write_u8(1);
                Ok(())
            }
            ClientChangeCipherSpec | ServerChangeCipherSpec => {
                if ctx.handshake.io_buffer.peek() != [1] {
                    return Err(TlsError::BadMessage);
                }
                Ok(())
            }
            ClientFinished | ServerFinished if outbound => {
                let digest = ctx.handshake.transcript.digest(Self::prf(ctx));
                ctx.handshake.io_buffer.write(&digest[..12]);
                Ok(())
            }
            ClientFinished | ServerFinished => {
                let digest = ctx.handshake.transcript.digest(Self::prf(ctx));
                if ctx.handshake.io_buffer.peek() != &digest[..12] {
                    return Err(TlsError::HandshakeFailure);
                }
                Ok(())
            }
            // Empty and ignored bodies: ServerHelloDone, inbound dummies.
            _ => Ok(()),
        }
    }
}

/// Two wired engines plus the taps and logs the assertions read.
struct Harness {
    client: Connection<Pipe>,
    server: Connection<Pipe>,
    client_out: Queue,
    server_out: Queue,
    client_in: Queue,
    server_in: Queue,
    tap_c2s: Vec<u8>,
    tap_s2c: Vec<u8>,
    events: Events,
    client_cork: CorkLog,
    store: SharedStore,
    client_write_fail: Rc<RefCell<bool>>,
}

fn harness(
    client_config: Config,
    server_config: Config,
    client_knobs: Knobs,
    server_knobs: Knobs,
    store: SharedStore,
) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let (client_out, server_out) = (queue(), queue());
    let (client_in, server_in) = (queue(), queue());
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let client_cork: CorkLog = Rc::new(RefCell::new(Vec::new()));
    let server_cork: CorkLog = Rc::new(RefCell::new(Vec::new()));
    let client_write_fail = Rc::new(RefCell::new(false));

    let client_pipe = Pipe {
        rx: client_in.clone(),
        tx: client_out.clone(),
        cork_log: client_cork.clone(),
        write_fail: client_write_fail.clone(),
    };
    let server_pipe = Pipe {
        rx: server_in.clone(),
        tx: server_out.clone(),
        cork_log: server_cork,
        write_fail: Rc::new(RefCell::new(false)),
    };

    let client = Connection::client(
        client_pipe,
        client_config,
        Box::new(TestHandlers {
            knobs: client_knobs,
            events: events.clone(),
        }),
    );
    let server = Connection::server(
        server_pipe,
        server_config,
        Box::new(TestHandlers {
            knobs: server_knobs,
            events: events.clone(),
        }),
    )
    .with_session_store(Box::new(store.clone()));

    Harness {
        client,
        server,
        client_out,
        server_out,
        client_in,
        server_in,
        tap_c2s: Vec::new(),
        tap_s2c: Vec::new(),
        events,
        client_cork,
        store,
        client_write_fail,
    }
}

/// Move up to `burst` bytes from one queue to another, tapping them.
fn pump(from: &Queue, to: &Queue, tap: &mut Vec<u8>, burst: usize) -> usize {
    let mut from = from.borrow_mut();
    let mut to = to.borrow_mut();
    let mut moved = 0;
    while moved < burst {
        match from.pop_front() {
            Some(b) => {
                tap.push(b);
                to.push_back(b);
                moved += 1;
            }
            None => break,
        }
    }
    moved
}

/// Alternate the two engines, delivering at most `burst` bytes per
/// direction per round, until both complete or either fails fatally.
fn drive(h: &mut Harness, burst: usize) -> (Result<(), TlsError>, Result<(), TlsError>) {
    let mut client_blocked = Blocked::NotBlocked;
    let mut server_blocked = Blocked::NotBlocked;

    for _ in 0..20_000 {
        let client_result = h.client.negotiate(&mut client_blocked);
        pump(&h.client_out, &h.server_in, &mut h.tap_c2s, burst);

        let server_result = h.server.negotiate(&mut server_blocked);
        pump(&h.server_out, &h.client_in, &mut h.tap_s2c, burst);

        let client_fatal = matches!(&client_result, Err(e) if !e.is_retryable());
        let server_fatal = matches!(&server_result, Err(e) if !e.is_retryable());
        let done = client_result.is_ok() && server_result.is_ok();
        if done || client_fatal || server_fatal {
            return (client_result, server_result);
        }
    }
    panic!("handshake did not converge");
}

/// Wire order of dispatched messages as the server saw them.
fn server_view(events: &Events) -> Vec<&'static str> {
    events
        .borrow()
        .iter()
        .filter(|(role, _)| *role == Role::Server)
        .map(|(_, name)| *name)
        .collect()
}

/// Concatenated handshake-record payloads of a raw byte stream.
fn handshake_payload(raw: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    let mut i = 0;
    while i + 5 <= raw.len() {
        let record_type = raw[i];
        let len = u16::from_be_bytes([raw[i + 3], raw[i + 4]]) as usize;
        if record_type == 22 {
            payload.extend_from_slice(&raw[i + 5..i + 5 + len]);
        }
        i += 5 + len;
    }
    payload
}

/// Split a reassembled handshake stream into header+body messages.
fn split_messages(stream: &[u8]) -> VecDeque<Vec<u8>> {
    let mut messages = VecDeque::new();
    let mut i = 0;
    while i + 4 <= stream.len() {
        let len = ((stream[i + 1] as usize) << 16)
            | ((stream[i + 2] as usize) << 8)
            | stream[i + 3] as usize;
        messages.push_back(stream[i..i + 4 + len].to_vec());
        i += 4 + len;
    }
    messages
}

fn all_hashes() -> HashRequirements {
    HashRequirements {
        version: None,
        prf: None,
        sig_hashes: HashAlgs::empty(),
    }
}

// --- Scenarios ---------------------------------------------------------

#[test]
fn resumption_without_ticket() {
    let store = SharedStore::new();
    store.0.borrow_mut().cache_hit = true;

    let mut h = harness(
        Config::new(),
        Config::new().use_session_cache(true),
        Knobs {
            offer_session_id: vec![0x5E; 32],
            ..Knobs::default()
        },
        Knobs::default(),
        store,
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    assert_eq!(
        server_view(&h.events),
        vec![
            "CLIENT_HELLO",
            "SERVER_HELLO",
            "SERVER_CHANGE_CIPHER_SPEC",
            "SERVER_FINISHED",
            "CLIENT_CHANGE_CIPHER_SPEC",
            "CLIENT_FINISHED",
        ]
    );
    assert_eq!(h.client.handshake_type(), HandshakeType::NEGOTIATED);
    assert_eq!(h.server.handshake_type(), HandshakeType::NEGOTIATED);
    assert_eq!(h.store.0.borrow().resumes, vec![vec![0x5E; 32]]);
}

#[test]
fn resumption_with_new_ticket() {
    let store = SharedStore::new();
    store.0.borrow_mut().ticket_outcome = Some(TicketOutcome::ResumedReissue);
    store.0.borrow_mut().key_available = true;

    let mut h = harness(
        Config::new().use_tickets(true),
        Config::new().use_tickets(true),
        Knobs {
            client_offer_ticket: Some(b"opaque-ticket".to_vec()),
            ..Knobs::default()
        },
        Knobs::default(),
        store,
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    assert_eq!(
        server_view(&h.events),
        vec![
            "CLIENT_HELLO",
            "SERVER_HELLO",
            "SERVER_NEW_SESSION_TICKET",
            "SERVER_CHANGE_CIPHER_SPEC",
            "SERVER_FINISHED",
            "CLIENT_CHANGE_CIPHER_SPEC",
            "CLIENT_FINISHED",
        ]
    );
    let expected = HandshakeType::NEGOTIATED | HandshakeType::WITH_SESSION_TICKET;
    assert_eq!(h.client.handshake_type(), expected);
    assert_eq!(h.server.handshake_type(), expected);
    // Ticket processing settled resumption; the cache was never touched.
    assert!(h.store.0.borrow().resumes.is_empty());
}

#[test]
fn full_handshake_with_forward_secrecy() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    assert_eq!(
        server_view(&h.events),
        vec![
            "CLIENT_HELLO",
            "SERVER_HELLO",
            "SERVER_CERT",
            "SERVER_KEY",
            "SERVER_HELLO_DONE",
            "CLIENT_KEY",
            "CLIENT_CHANGE_CIPHER_SPEC",
            "CLIENT_FINISHED",
            "SERVER_CHANGE_CIPHER_SPEC",
            "SERVER_FINISHED",
        ]
    );
    let expected = HandshakeType::NEGOTIATED
        | HandshakeType::FULL_HANDSHAKE
        | HandshakeType::PERFECT_FORWARD_SECRECY;
    assert_eq!(h.client.handshake_type(), expected);
    assert_eq!(h.server.handshake_type(), expected);
    // The server issued a fresh 32-byte session ID.
    assert_eq!(h.server.session().session_id.len(), 32);
    assert_eq!(h.client.session().session_id, h.server.session().session_id);
}

#[test]
fn full_handshake_ocsp_and_required_client_auth() {
    let mut h = harness(
        Config::new().client_cert_auth(CertAuthType::Required),
        Config::new().client_cert_auth(CertAuthType::Required),
        Knobs {
            client_request_ocsp: true,
            ..Knobs::default()
        },
        Knobs {
            server_send_ocsp: true,
            ..Knobs::default()
        },
        SharedStore::new(),
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    assert_eq!(
        server_view(&h.events),
        vec![
            "CLIENT_HELLO",
            "SERVER_HELLO",
            "SERVER_CERT",
            "SERVER_CERT_STATUS",
            "SERVER_KEY",
            "SERVER_CERT_REQ",
            "SERVER_HELLO_DONE",
            "CLIENT_CERT",
            "CLIENT_KEY",
            "CLIENT_CERT_VERIFY",
            "CLIENT_CHANGE_CIPHER_SPEC",
            "CLIENT_FINISHED",
            "SERVER_CHANGE_CIPHER_SPEC",
            "SERVER_FINISHED",
        ]
    );
    let expected = HandshakeType::NEGOTIATED
        | HandshakeType::FULL_HANDSHAKE
        | HandshakeType::PERFECT_FORWARD_SECRECY
        | HandshakeType::OCSP_STATUS
        | HandshakeType::CLIENT_AUTH;
    assert_eq!(h.client.handshake_type(), expected);
    assert_eq!(h.server.handshake_type(), expected);
}

#[test]
fn optional_client_auth_with_empty_certificate() {
    // The client does not anticipate the certificate request: its
    // sequence upgrades mid-flight when CERTIFICATE_REQUEST arrives where
    // SERVER_HELLO_DONE was expected.
    let mut h = harness(
        Config::new().client_cert_auth(CertAuthType::Optional),
        Config::new().client_cert_auth(CertAuthType::Optional),
        Knobs {
            client_request_ocsp: true,
            empty_client_cert: true,
            ..Knobs::default()
        },
        Knobs {
            server_send_ocsp: true,
            ..Knobs::default()
        },
        SharedStore::new(),
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    let view = server_view(&h.events);
    assert!(view.contains(&"CLIENT_CERT"));
    assert!(!view.contains(&"CLIENT_CERT_VERIFY"));

    let expected = HandshakeType::NEGOTIATED
        | HandshakeType::FULL_HANDSHAKE
        | HandshakeType::PERFECT_FORWARD_SECRECY
        | HandshakeType::OCSP_STATUS
        | HandshakeType::CLIENT_AUTH
        | HandshakeType::NO_CLIENT_CERT;
    assert_eq!(h.client.handshake_type(), expected);
    assert_eq!(h.server.handshake_type(), expected);
}

#[test]
fn adaptive_ocsp_drop() {
    // The client believes a stapled response is coming; the server skips
    // it. SERVER_HELLO_DONE arrives where SERVER_CERT_STATUS was
    // expected and the client clears the flag in place.
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs {
            cipher: CipherSuite::RsaAes128GcmSha256,
            client_expect_ocsp: true,
            ..Knobs::default()
        },
        Knobs {
            cipher: CipherSuite::RsaAes128GcmSha256,
            ..Knobs::default()
        },
        SharedStore::new(),
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    let expected = HandshakeType::NEGOTIATED | HandshakeType::FULL_HANDSHAKE;
    assert_eq!(h.client.handshake_type(), expected);
    assert_eq!(h.server.handshake_type(), expected);
    assert!(!server_view(&h.events).contains(&"SERVER_CERT_STATUS"));
}

// --- Properties --------------------------------------------------------

#[test]
fn transcript_matches_wire_bytes() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    // Rebuild the wire transcript: every handshake-record message,
    // header plus body, in the order the messages were dispatched.
    let mut from_client = split_messages(&handshake_payload(&h.tap_c2s));
    let mut from_server = split_messages(&handshake_payload(&h.tap_s2c));
    let mut expected = Transcript::new();
    for (_, name) in h
        .events
        .borrow()
        .iter()
        .filter(|(role, _)| *role == Role::Server)
    {
        // ChangeCipherSpec never reaches the transcript.
        if name.ends_with("CHANGE_CIPHER_SPEC") {
            continue;
        }
        let message = if name.starts_with("CLIENT") {
            from_client.pop_front()
        } else {
            from_server.pop_front()
        };
        expected.update(&all_hashes(), &message.unwrap());
    }
    assert!(from_client.is_empty());
    assert!(from_server.is_empty());

    let want = expected.digest(HashAlg::Sha256);
    assert_eq!(h.client.handshake().transcript.digest(HashAlg::Sha256), want);
    assert_eq!(h.server.handshake().transcript.digest(HashAlg::Sha256), want);
}

#[test]
fn byte_at_a_time_delivery_is_equivalent() {
    let run = |burst: usize| {
        let mut h = harness(
            Config::new().client_cert_auth(CertAuthType::Required),
            Config::new().client_cert_auth(CertAuthType::Required),
            Knobs::default(),
            Knobs::default(),
            SharedStore::new(),
        );
        let (client, server) = drive(&mut h, burst);
        client.unwrap();
        server.unwrap();
        (
            h.client.handshake_type(),
            h.server.handshake_type(),
            h.client.handshake().transcript.digest(HashAlg::Sha256),
            server_view(&h.events),
        )
    };

    assert_eq!(run(1), run(usize::MAX));
}

#[test]
fn tiny_fragments_are_reassembled() {
    // Two-byte records force every handshake message header and body to
    // span record boundaries.
    let mut h = harness(
        Config::new().fragment_length(2),
        Config::new().fragment_length(2),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();
    assert!(h.client.is_handshake_complete());
    assert!(h.server.is_handshake_complete());
}

#[test]
fn unexpected_message_type_is_rejected() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );

    // Hand the server a ServerHello where ClientHello must come first.
    let rogue = [22u8, 3, 3, 0, 6, 2, 0, 0, 2, 0xAA, 0xBB];
    h.server_in.borrow_mut().extend(rogue);

    let mut blocked = Blocked::NotBlocked;
    let err = h.server.negotiate(&mut blocked).unwrap_err();
    assert!(matches!(err, TlsError::BadMessage));

    // The connection is dead from here on.
    let err = h.server.negotiate(&mut blocked).unwrap_err();
    assert!(matches!(err, TlsError::ConnectionClosed));
}

#[test]
fn application_data_mid_handshake_is_rejected() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );
    h.server_in.borrow_mut().extend([23u8, 3, 3, 0, 1, 0x00]);

    let mut blocked = Blocked::NotBlocked;
    let err = h.server.negotiate(&mut blocked).unwrap_err();
    assert!(matches!(err, TlsError::BadMessage));
}

#[test]
fn heartbeat_records_are_ignored() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );
    // A heartbeat record ahead of the client flight must not disturb the
    // handshake.
    h.server_in.borrow_mut().extend([24u8, 3, 3, 0, 3, 1, 2, 3]);

    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();
}

#[test]
fn write_error_prefers_peer_alert() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );

    // The client's transport is broken, and the peer's explanation (a
    // fatal handshake_failure alert) is already waiting to be read.
    *h.client_write_fail.borrow_mut() = true;
    h.client_in.borrow_mut().extend([21u8, 3, 3, 0, 2, 2, 40]);

    let mut blocked = Blocked::NotBlocked;
    let err = h.client.negotiate(&mut blocked).unwrap_err();
    assert!(matches!(
        err,
        TlsError::AlertReceived(AlertDescription::HandshakeFailure)
    ));
}

#[test]
fn write_error_without_alert_surfaces_original() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );
    *h.client_write_fail.borrow_mut() = true;

    let mut blocked = Blocked::NotBlocked;
    let err = h.client.negotiate(&mut blocked).unwrap_err();
    assert!(matches!(err, TlsError::Io(_)));
}

#[test]
fn failed_handshake_invalidates_cache_entry() {
    let mut h = harness(
        Config::new(),
        Config::new().use_session_cache(true),
        Knobs::default(),
        Knobs {
            fail_on: Some("CLIENT_KEY"),
            ..Knobs::default()
        },
        SharedStore::new(),
    );
    let (_, server) = drive(&mut h, usize::MAX);
    assert!(matches!(server, Err(TlsError::HandshakeFailure)));

    // The freshly issued session ID was scrubbed from the cache.
    let session_id = h.server.session().session_id.clone();
    assert_eq!(session_id.len(), 32);
    assert_eq!(h.store.0.borrow().deletes, vec![session_id]);
}

#[test]
fn corking_follows_writer_transitions() {
    let mut h = harness(
        Config::new().managed_corking(true),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );
    let (client, server) = drive(&mut h, usize::MAX);
    client.unwrap();
    server.unwrap();

    let log = h.client_cork.borrow();
    let corks: Vec<&str> = log
        .iter()
        .filter(|e| **e != "quickack")
        .copied()
        .collect();
    // Uncork after our hello, cork for the second flight, uncork when the
    // server takes over, uncork again on reaching application data.
    assert_eq!(corks, vec!["uncork", "cork", "uncork", "uncork"]);

    // Every advance sets quickack; ten messages advance ten times.
    let quickacks = log.iter().filter(|e| **e == "quickack").count();
    assert_eq!(quickacks, 10);
}

#[test]
fn sslv2_client_hello_is_canonicalized() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );

    // SSLv2 framing: two length bytes with the high bit set, message
    // type 1, client version 3.3, then the body.
    let body = b"legacy-format-hello";
    let record_len = (body.len() + 3) as u16;
    let mut raw = vec![0x80 | (record_len >> 8) as u8, record_len as u8, 1, 3, 3];
    raw.extend_from_slice(body);
    h.server_in.borrow_mut().extend(raw);

    let mut blocked = Blocked::NotBlocked;
    let result = h.server.negotiate(&mut blocked);
    assert!(matches!(result, Err(TlsError::WouldBlock)));
    assert_eq!(blocked, Blocked::Read);

    assert!(h.server.session().sslv2);
    assert!(h
        .server
        .handshake_type()
        .contains(HandshakeType::FULL_HANDSHAKE));

    // The transcript saw the canonicalized header bytes, the body, and
    // then the server's own flight.
    let mut server_flight: Vec<u8> = Vec::new();
    pump(
        &h.server_out,
        &h.client_in,
        &mut server_flight,
        usize::MAX,
    );
    let mut expected = Transcript::new();
    expected.update(&all_hashes(), &[1, 3, 3]);
    expected.update(&all_hashes(), body);
    for message in split_messages(&handshake_payload(&server_flight)) {
        expected.update(&all_hashes(), &message);
    }
    assert_eq!(
        h.server.handshake().transcript.digest(HashAlg::Sha256),
        expected.digest(HashAlg::Sha256)
    );
}

#[test]
fn sslv2_after_client_hello_is_rejected() {
    let mut h = harness(
        Config::new(),
        Config::new(),
        Knobs::default(),
        Knobs::default(),
        SharedStore::new(),
    );

    // A legitimate first flight from the real client...
    let mut blocked = Blocked::NotBlocked;
    let _ = h.client.negotiate(&mut blocked);
    pump(&h.client_out, &h.server_in, &mut h.tap_c2s, usize::MAX);
    let _ = h.server.negotiate(&mut blocked);
    pump(&h.server_out, &h.client_in, &mut h.tap_s2c, usize::MAX);

    // ...then SSLv2 framing mid-handshake on the client side.
    h.client_in.borrow_mut().clear();
    h.client_in
        .borrow_mut()
        .extend([0x80u8, 4, 1, 3, 3, 0xAA]);
    let err = h.client.negotiate(&mut blocked).unwrap_err();
    assert!(matches!(err, TlsError::BadMessage));
}
