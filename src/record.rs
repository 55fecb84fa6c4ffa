//! Record framing.
//!
//! Plaintext record encapsulation for the handshake driver: header codec,
//! a resumable reader that survives partial transport reads, and a write
//! buffer flushed with a cursor so a blocked flush picks up where it left
//! off. Record protection is layered on by the surrounding connection
//! object once keys are active; the driver never depends on it.

use crate::buffer::Buffer;
use crate::transport::Transport;
use crate::TlsError;

/// Record header length: type, version, payload length.
pub const RECORD_HEADER_LEN: usize = 5;

/// Maximum record payload (2^14, RFC 5246 §6.2.1).
pub const MAX_RECORD_PAYLOAD: usize = 1 << 14;

/// Content type for TLS records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordType {
    /// Change cipher spec.
    ChangeCipherSpec = 20,
    /// Alert.
    Alert = 21,
    /// Handshake.
    Handshake = 22,
    /// Application data.
    ApplicationData = 23,
}

impl RecordType {
    /// Parse from byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            20 => Some(RecordType::ChangeCipherSpec),
            21 => Some(RecordType::Alert),
            22 => Some(RecordType::Handshake),
            23 => Some(RecordType::ApplicationData),
            _ => None,
        }
    }
}

/// Inbound record reader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InStatus {
    /// Expecting a fresh record header.
    Fresh,
    /// A complete record payload is buffered and unconsumed.
    Buffered,
}

/// Record-layer I/O state for one connection.
#[derive(Debug)]
pub struct RecordIo {
    /// Raw header of the record currently being read.
    header_in: Buffer,
    /// Payload of the current inbound record, with read cursor.
    pub in_frag: Buffer,
    /// Outbound framed bytes not yet accepted by the transport.
    out: Buffer,
    in_status: InStatus,
}

impl RecordIo {
    /// Create fresh record I/O state.
    pub fn new() -> Self {
        Self {
            header_in: Buffer::new(),
            in_frag: Buffer::new(),
            out: Buffer::new(),
            in_status: InStatus::Fresh,
        }
    }

    /// Read exactly one record, resumably.
    ///
    /// Returns the raw content-type byte and whether the record was an
    /// SSLv2-format `ClientHello`. SSLv2 framing is only recognized when
    /// `allow_sslv2` is set; otherwise a set high bit in the first header
    /// byte is a protocol violation.
    ///
    /// On `WouldBlock` all partial progress is kept; the next call
    /// continues filling the same header and payload.
    pub fn read_full_record<T: Transport>(
        &mut self,
        transport: &mut T,
        allow_sslv2: bool,
    ) -> Result<(u8, bool), TlsError> {
        if self.in_status == InStatus::Buffered {
            let (type_byte, sslv2, _) = self.classify(allow_sslv2)?;
            return Ok((type_byte, sslv2));
        }

        // Both TLS and SSLv2-style headers occupy five bytes here: for
        // SSLv2 that is the two length bytes plus message type and the
        // client hello version.
        fill(transport, &mut self.header_in, RECORD_HEADER_LEN)?;
        let (type_byte, sslv2, payload_len) = self.classify(allow_sslv2)?;

        fill(transport, &mut self.in_frag, payload_len)?;
        self.in_status = InStatus::Buffered;
        Ok((type_byte, sslv2))
    }

    /// Interpret the buffered header.
    fn classify(&self, allow_sslv2: bool) -> Result<(u8, bool, usize), TlsError> {
        let hdr = self.header_in.bytes();
        let first = hdr[0];

        if first & 0x80 != 0 {
            if !allow_sslv2 {
                return Err(TlsError::BadMessage);
            }
            let record_len = (((first & 0x7f) as usize) << 8) | hdr[1] as usize;
            // Message type and version were consumed with the header.
            let payload_len = record_len
                .checked_sub(3)
                .ok_or(TlsError::BadMessage)?;
            if payload_len > MAX_RECORD_PAYLOAD {
                return Err(TlsError::BadMessage);
            }
            return Ok((first, true, payload_len));
        }

        let payload_len = ((hdr[3] as usize) << 8) | hdr[4] as usize;
        if payload_len > MAX_RECORD_PAYLOAD {
            return Err(TlsError::BadMessage);
        }
        Ok((first, false, payload_len))
    }

    /// The canonicalized SSLv2 header range fed to the transcript: the
    /// message type byte and the two client version bytes.
    pub fn sslv2_header_canon(&self) -> &[u8] {
        &self.header_in.bytes()[2..RECORD_HEADER_LEN]
    }

    /// Mark the current inbound record consumed and expect a fresh header.
    pub fn consume(&mut self) {
        self.header_in.wipe();
        self.in_frag.wipe();
        self.in_status = InStatus::Fresh;
    }

    /// Frame a payload fragment into the outbound buffer.
    pub fn write_record(&mut self, record_type: RecordType, version: [u8; 2], payload: &[u8]) {
        self.out.write(&[record_type as u8, version[0], version[1]]);
        self.out.write(&(payload.len() as u16).to_be_bytes());
        self.out.write(payload);
    }

    /// Whether outbound bytes are waiting on the transport.
    pub fn has_pending_output(&self) -> bool {
        self.out.remaining() > 0
    }

    /// Drain the outbound buffer into the transport.
    ///
    /// A partial write advances the cursor, so a blocked flush resumes
    /// mid-record without re-submitting bytes.
    pub fn flush<T: Transport>(&mut self, transport: &mut T) -> Result<(), TlsError> {
        while self.out.remaining() > 0 {
            let n = transport.write(self.out.peek())?;
            if n == 0 {
                return Err(TlsError::ConnectionClosed);
            }
            self.out.skip(n);
        }
        transport.flush()?;
        self.out.wipe();
        Ok(())
    }
}

impl Default for RecordIo {
    fn default() -> Self {
        Self::new()
    }
}

/// Top up `buf` to `target` bytes from the transport.
fn fill<T: Transport>(transport: &mut T, buf: &mut Buffer, target: usize) -> Result<(), TlsError> {
    let mut chunk = [0u8; 4096];
    while buf.len() < target {
        let want = (target - buf.len()).min(chunk.len());
        let n = transport.read(&mut chunk[..want])?;
        if n == 0 {
            return Err(TlsError::ConnectionClosed);
        }
        buf.write(&chunk[..n]);
    }
    Ok(())
}
