//! Running handshake transcript.
//!
//! Every handshake message (4-byte header plus body) is fed, in wire
//! order, into each hash algorithm whose result the negotiated parameters
//! still need. `ChangeCipherSpec`, alerts, and record headers are never
//! fed. Which hashes are needed is re-evaluated on every update, because
//! negotiation narrows the set mid-handshake.

use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::cipher::{HashAlg, HashAlgs};
use crate::TlsVersion;

/// The parameters deciding which transcript hashes are still required.
#[derive(Debug, Clone, Copy)]
pub struct HashRequirements {
    /// Negotiated protocol version, if any.
    pub version: Option<TlsVersion>,
    /// PRF hash of the negotiated cipher suite, if any.
    pub prf: Option<HashAlg>,
    /// Hashes appearing in signature algorithms the handlers still need.
    pub sig_hashes: HashAlgs,
}

impl HashRequirements {
    /// Whether `alg` must keep tracking the transcript.
    ///
    /// Until version and cipher are committed, everything is required.
    pub fn requires(&self, alg: HashAlg) -> bool {
        let version = match self.version {
            Some(v) => v,
            None => return true,
        };
        if version < TlsVersion::Tls12 {
            return matches!(alg, HashAlg::Md5 | HashAlg::Sha1 | HashAlg::Md5Sha1);
        }
        if alg == HashAlg::Md5Sha1 {
            return self.requires(HashAlg::Md5) && self.requires(HashAlg::Sha1);
        }
        let prf = match self.prf {
            Some(p) => p,
            None => return true,
        };
        if prf == alg {
            return true;
        }
        alg.flag().map_or(false, |f| self.sig_hashes.contains(f))
    }
}

/// Running hash states for every algorithm a handshake may need.
#[derive(Clone)]
pub struct Transcript {
    md5: Md5,
    sha1: Sha1,
    md5_sha1: (Md5, Sha1),
    sha224: Sha224,
    sha256: Sha256,
    sha384: Sha384,
    sha512: Sha512,
}

impl Transcript {
    /// Fresh transcript with every hash at its initial state.
    pub fn new() -> Self {
        Self {
            md5: Md5::new(),
            sha1: Sha1::new(),
            md5_sha1: (Md5::new(), Sha1::new()),
            sha224: Sha224::new(),
            sha256: Sha256::new(),
            sha384: Sha384::new(),
            sha512: Sha512::new(),
        }
    }

    /// Feed `data` to every hash `reqs` still requires.
    pub fn update(&mut self, reqs: &HashRequirements, data: &[u8]) {
        if reqs.requires(HashAlg::Md5) {
            self.md5.update(data);
        }
        if reqs.requires(HashAlg::Sha1) {
            self.sha1.update(data);
        }
        if reqs.requires(HashAlg::Md5Sha1) {
            self.md5_sha1.0.update(data);
            self.md5_sha1.1.update(data);
        }
        if reqs.requires(HashAlg::Sha224) {
            self.sha224.update(data);
        }
        if reqs.requires(HashAlg::Sha256) {
            self.sha256.update(data);
        }
        if reqs.requires(HashAlg::Sha384) {
            self.sha384.update(data);
        }
        if reqs.requires(HashAlg::Sha512) {
            self.sha512.update(data);
        }
    }

    /// Digest of the transcript so far.
    ///
    /// The running state is left intact, so a handler can read the
    /// transcript up to but not including its own message.
    pub fn digest(&self, alg: HashAlg) -> Vec<u8> {
        match alg {
            HashAlg::Md5 => self.md5.clone().finalize().to_vec(),
            HashAlg::Sha1 => self.sha1.clone().finalize().to_vec(),
            HashAlg::Md5Sha1 => {
                let mut out = self.md5_sha1.0.clone().finalize().to_vec();
                out.extend_from_slice(&self.md5_sha1.1.clone().finalize());
                out
            }
            HashAlg::Sha224 => self.sha224.clone().finalize().to_vec(),
            HashAlg::Sha256 => self.sha256.clone().finalize().to_vec(),
            HashAlg::Sha384 => self.sha384.clone().finalize().to_vec(),
            HashAlg::Sha512 => self.sha512.clone().finalize().to_vec(),
        }
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}
