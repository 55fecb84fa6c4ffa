//! TLS alert observation.
//!
//! The handshake driver only observes alerts: it classifies the level,
//! surfaces fatal alerts as errors, and tolerates warnings. Emitting
//! alerts belongs to the surrounding connection object.

use log::debug;

use crate::TlsError;

/// Alert level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertLevel {
    /// Warning.
    Warning = 1,
    /// Fatal.
    Fatal = 2,
}

impl AlertLevel {
    /// Parse from byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(AlertLevel::Warning),
            2 => Some(AlertLevel::Fatal),
            _ => None,
        }
    }
}

/// TLS alert description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    RecordOverflow = 22,
    HandshakeFailure = 40,
    BadCertificate = 42,
    UnsupportedCertificate = 43,
    CertificateRevoked = 44,
    CertificateExpired = 45,
    CertificateUnknown = 46,
    IllegalParameter = 47,
    UnknownCa = 48,
    AccessDenied = 49,
    DecodeError = 50,
    DecryptError = 51,
    ProtocolVersion = 70,
    InsufficientSecurity = 71,
    InternalError = 80,
    InappropriateFallback = 86,
    UserCanceled = 90,
    NoRenegotiation = 100,
    UnsupportedExtension = 110,
    UnrecognizedName = 112,
    BadCertificateStatusResponse = 113,
}

impl AlertDescription {
    /// Parse from byte.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(AlertDescription::CloseNotify),
            10 => Some(AlertDescription::UnexpectedMessage),
            20 => Some(AlertDescription::BadRecordMac),
            22 => Some(AlertDescription::RecordOverflow),
            40 => Some(AlertDescription::HandshakeFailure),
            42 => Some(AlertDescription::BadCertificate),
            43 => Some(AlertDescription::UnsupportedCertificate),
            44 => Some(AlertDescription::CertificateRevoked),
            45 => Some(AlertDescription::CertificateExpired),
            46 => Some(AlertDescription::CertificateUnknown),
            47 => Some(AlertDescription::IllegalParameter),
            48 => Some(AlertDescription::UnknownCa),
            49 => Some(AlertDescription::AccessDenied),
            50 => Some(AlertDescription::DecodeError),
            51 => Some(AlertDescription::DecryptError),
            70 => Some(AlertDescription::ProtocolVersion),
            71 => Some(AlertDescription::InsufficientSecurity),
            80 => Some(AlertDescription::InternalError),
            86 => Some(AlertDescription::InappropriateFallback),
            90 => Some(AlertDescription::UserCanceled),
            100 => Some(AlertDescription::NoRenegotiation),
            110 => Some(AlertDescription::UnsupportedExtension),
            112 => Some(AlertDescription::UnrecognizedName),
            113 => Some(AlertDescription::BadCertificateStatusResponse),
            _ => None,
        }
    }
}

/// Process an inbound alert record body.
///
/// A fatal alert surfaces as `AlertReceived`; `close_notify` surfaces as
/// `ConnectionClosed`; other warnings are logged and ignored.
pub fn process(body: &[u8]) -> Result<(), TlsError> {
    if body.len() < 2 {
        return Err(TlsError::BadMessage);
    }

    let level = AlertLevel::from_byte(body[0]).ok_or(TlsError::BadMessage)?;
    let description = AlertDescription::from_byte(body[1]).ok_or(TlsError::BadMessage)?;

    match level {
        AlertLevel::Fatal => Err(TlsError::AlertReceived(description)),
        AlertLevel::Warning if description == AlertDescription::CloseNotify => {
            Err(TlsError::ConnectionClosed)
        }
        AlertLevel::Warning => {
            debug!("ignoring warning alert: {:?}", description);
            Ok(())
        }
    }
}
