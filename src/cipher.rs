//! Cipher suite catalogue.
//!
//! Only the properties the handshake state machine needs are modelled
//! here: the PRF hash a suite selects under TLS 1.2, and whether its key
//! exchange is ephemeral. Bulk cipher and MAC parameters belong to the
//! record layer.

use bitflags::bitflags;

/// Hash algorithm used by the handshake transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlg {
    Md5,
    Sha1,
    /// MD5 and SHA-1 digests concatenated, as used by the TLS 1.0/1.1 PRF.
    Md5Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

bitflags! {
    /// Set of single hash algorithms, used to track signature hashes the
    /// message handlers still need out of the transcript.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HashAlgs: u8 {
        const MD5 = 0x01;
        const SHA1 = 0x02;
        const SHA224 = 0x04;
        const SHA256 = 0x08;
        const SHA384 = 0x10;
        const SHA512 = 0x20;
    }
}

impl HashAlg {
    /// The set flag for this algorithm; `None` for the concatenation,
    /// which is derived rather than tracked.
    pub fn flag(&self) -> Option<HashAlgs> {
        match self {
            HashAlg::Md5 => Some(HashAlgs::MD5),
            HashAlg::Sha1 => Some(HashAlgs::SHA1),
            HashAlg::Md5Sha1 => None,
            HashAlg::Sha224 => Some(HashAlgs::SHA224),
            HashAlg::Sha256 => Some(HashAlgs::SHA256),
            HashAlg::Sha384 => Some(HashAlgs::SHA384),
            HashAlg::Sha512 => Some(HashAlgs::SHA512),
        }
    }
}

/// Key exchange algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchange {
    /// RSA key transport.
    Rsa,
    /// Ephemeral finite-field Diffie-Hellman.
    Dhe,
    /// Ephemeral elliptic-curve Diffie-Hellman.
    Ecdhe,
}

impl KeyExchange {
    /// Whether the exchange provides forward secrecy.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, KeyExchange::Dhe | KeyExchange::Ecdhe)
    }
}

/// TLS cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    /// TLS_RSA_WITH_AES_128_CBC_SHA.
    RsaAes128CbcSha,
    /// TLS_RSA_WITH_AES_256_CBC_SHA.
    RsaAes256CbcSha,
    /// TLS_RSA_WITH_AES_128_GCM_SHA256.
    RsaAes128GcmSha256,
    /// TLS_RSA_WITH_AES_256_GCM_SHA384.
    RsaAes256GcmSha384,
    /// TLS_DHE_RSA_WITH_AES_128_GCM_SHA256.
    DheRsaAes128GcmSha256,
    /// TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256.
    EcdheRsaAes128GcmSha256,
    /// TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384.
    EcdheRsaAes256GcmSha384,
    /// TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256.
    EcdheEcdsaAes128GcmSha256,
    /// TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384.
    EcdheEcdsaAes256GcmSha384,
    /// TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256.
    EcdheRsaChacha20Poly1305,
    /// TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256.
    EcdheEcdsaChacha20Poly1305,
}

impl CipherSuite {
    /// Get cipher suite ID.
    pub fn to_id(&self) -> u16 {
        match self {
            CipherSuite::RsaAes128CbcSha => 0x002F,
            CipherSuite::RsaAes256CbcSha => 0x0035,
            CipherSuite::RsaAes128GcmSha256 => 0x009C,
            CipherSuite::RsaAes256GcmSha384 => 0x009D,
            CipherSuite::DheRsaAes128GcmSha256 => 0x009E,
            CipherSuite::EcdheRsaAes128GcmSha256 => 0xC02F,
            CipherSuite::EcdheRsaAes256GcmSha384 => 0xC030,
            CipherSuite::EcdheEcdsaAes128GcmSha256 => 0xC02B,
            CipherSuite::EcdheEcdsaAes256GcmSha384 => 0xC02C,
            CipherSuite::EcdheRsaChacha20Poly1305 => 0xCCA8,
            CipherSuite::EcdheEcdsaChacha20Poly1305 => 0xCCA9,
        }
    }

    /// Parse from ID.
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x002F => Some(CipherSuite::RsaAes128CbcSha),
            0x0035 => Some(CipherSuite::RsaAes256CbcSha),
            0x009C => Some(CipherSuite::RsaAes128GcmSha256),
            0x009D => Some(CipherSuite::RsaAes256GcmSha384),
            0x009E => Some(CipherSuite::DheRsaAes128GcmSha256),
            0xC02F => Some(CipherSuite::EcdheRsaAes128GcmSha256),
            0xC030 => Some(CipherSuite::EcdheRsaAes256GcmSha384),
            0xC02B => Some(CipherSuite::EcdheEcdsaAes128GcmSha256),
            0xC02C => Some(CipherSuite::EcdheEcdsaAes256GcmSha384),
            0xCCA8 => Some(CipherSuite::EcdheRsaChacha20Poly1305),
            0xCCA9 => Some(CipherSuite::EcdheEcdsaChacha20Poly1305),
            _ => None,
        }
    }

    /// The hash the TLS 1.2 PRF uses with this suite.
    pub fn prf_hash(&self) -> HashAlg {
        match self {
            CipherSuite::RsaAes256GcmSha384
            | CipherSuite::EcdheRsaAes256GcmSha384
            | CipherSuite::EcdheEcdsaAes256GcmSha384 => HashAlg::Sha384,
            _ => HashAlg::Sha256,
        }
    }

    /// Key exchange family.
    pub fn key_exchange(&self) -> KeyExchange {
        match self {
            CipherSuite::RsaAes128CbcSha
            | CipherSuite::RsaAes256CbcSha
            | CipherSuite::RsaAes128GcmSha256
            | CipherSuite::RsaAes256GcmSha384 => KeyExchange::Rsa,
            CipherSuite::DheRsaAes128GcmSha256 => KeyExchange::Dhe,
            CipherSuite::EcdheRsaAes128GcmSha256
            | CipherSuite::EcdheRsaAes256GcmSha384
            | CipherSuite::EcdheEcdsaAes128GcmSha256
            | CipherSuite::EcdheEcdsaAes256GcmSha384
            | CipherSuite::EcdheRsaChacha20Poly1305
            | CipherSuite::EcdheEcdsaChacha20Poly1305 => KeyExchange::Ecdhe,
        }
    }
}
