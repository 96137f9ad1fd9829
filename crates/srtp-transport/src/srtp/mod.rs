//! Secure RTP (SRTP) crypto sessions
//!
//! The transport talks to a [`CryptoSession`] per direction and media type.
//! [`SrtpSession`] is the default implementation, built on the RustCrypto
//! AES and HMAC-SHA1 primitives; other backends plug in through
//! [`SessionFactory`].

pub mod auth;
pub mod cipher;
pub mod key_derivation;
pub mod session;


use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

pub use auth::{SrtpAuthenticator, SrtpReplayProtection, MAX_REPLAY_WINDOW_SIZE};
pub use key_derivation::{KeyDerivationLabel, SessionKeys};
pub use session::{SrtpSession, DEFAULT_REPLAY_WINDOW_SIZE};

/// SRTP protection profiles understood by the default session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherSuite {
    /// AES-CM-128 + HMAC-SHA1-80 (RFC 3711 default)
    AesCm128HmacSha1_80,

    /// AES-CM-128 + HMAC-SHA1-32
    AesCm128HmacSha1_32,

    /// AEAD AES-128-GCM (RFC 7714)
    AeadAes128Gcm,

    /// AEAD AES-256-GCM (RFC 7714)
    AeadAes256Gcm,
}

impl CipherSuite {
    /// Numeric id used by signaling (matches the DTLS-SRTP profile numbering)
    pub fn id(self) -> i32 {
        match self {
            CipherSuite::AesCm128HmacSha1_80 => 1,
            CipherSuite::AesCm128HmacSha1_32 => 2,
            CipherSuite::AeadAes128Gcm => 7,
            CipherSuite::AeadAes256Gcm => 8,
        }
    }

    /// Look up a suite by its numeric id
    pub fn from_id(id: i32) -> Result<Self> {
        match id {
            1 => Ok(CipherSuite::AesCm128HmacSha1_80),
            2 => Ok(CipherSuite::AesCm128HmacSha1_32),
            7 => Ok(CipherSuite::AeadAes128Gcm),
            8 => Ok(CipherSuite::AeadAes256Gcm),
            other => Err(Error::UnsupportedCipherSuite(other)),
        }
    }

    /// SDES name of the suite
    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::AesCm128HmacSha1_80 => "AES_CM_128_HMAC_SHA1_80",
            CipherSuite::AesCm128HmacSha1_32 => "AES_CM_128_HMAC_SHA1_32",
            CipherSuite::AeadAes128Gcm => "AEAD_AES_128_GCM",
            CipherSuite::AeadAes256Gcm => "AEAD_AES_256_GCM",
        }
    }

    /// Look up a suite by its SDES name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "AES_CM_128_HMAC_SHA1_80" => Some(CipherSuite::AesCm128HmacSha1_80),
            "AES_CM_128_HMAC_SHA1_32" => Some(CipherSuite::AesCm128HmacSha1_32),
            "AEAD_AES_128_GCM" => Some(CipherSuite::AeadAes128Gcm),
            "AEAD_AES_256_GCM" => Some(CipherSuite::AeadAes256Gcm),
            _ => None,
        }
    }

    /// Master key length in bytes
    pub fn key_len(self) -> usize {
        match self {
            CipherSuite::AeadAes256Gcm => 32,
            _ => 16,
        }
    }

    /// Master salt length in bytes
    pub fn salt_len(self) -> usize {
        if self.is_aead() { 12 } else { 14 }
    }

    /// Length of the key ‖ salt blob handed over by signaling
    pub fn keying_material_len(self) -> usize {
        self.key_len() + self.salt_len()
    }

    /// Authentication tag appended to SRTP packets
    pub fn rtp_auth_tag_len(self) -> usize {
        match self {
            CipherSuite::AesCm128HmacSha1_80 => 10,
            CipherSuite::AesCm128HmacSha1_32 => 4,
            CipherSuite::AeadAes128Gcm | CipherSuite::AeadAes256Gcm => 16,
        }
    }

    /// Authentication tag appended to SRTCP packets.
    ///
    /// SRTCP always uses the 80-bit tag for the HMAC suites (RFC 5764, 4.1.2).
    pub fn rtcp_auth_tag_len(self) -> usize {
        match self {
            CipherSuite::AesCm128HmacSha1_80 | CipherSuite::AesCm128HmacSha1_32 => 10,
            CipherSuite::AeadAes128Gcm | CipherSuite::AeadAes256Gcm => 16,
        }
    }

    /// True for the AEAD (GCM) suites
    pub fn is_aead(self) -> bool {
        matches!(self, CipherSuite::AeadAes128Gcm | CipherSuite::AeadAes256Gcm)
    }

    /// True if tag computation can be handed to a downstream layer.
    ///
    /// Only the HMAC suites qualify: an AEAD tag cannot be produced without
    /// the cipher key.
    pub fn supports_external_auth(self) -> bool {
        !self.is_aead()
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SRTP master key and salt
#[derive(Clone, PartialEq, Eq)]
pub struct SrtpCryptoKey {
    key: Vec<u8>,
    salt: Vec<u8>,
}

impl SrtpCryptoKey {
    /// Create a key from separate master key and master salt
    pub fn new(key: Vec<u8>, salt: Vec<u8>) -> Self {
        Self { key, salt }
    }

    /// Split a key ‖ salt blob according to `suite`
    pub fn from_keying_material(suite: CipherSuite, material: &[u8]) -> Result<Self> {
        if material.len() != suite.keying_material_len() {
            return Err(Error::InvalidKey(format!(
                "{} needs {} bytes of keying material, got {}",
                suite,
                suite.keying_material_len(),
                material.len()
            )));
        }
        let (key, salt) = material.split_at(suite.key_len());
        Ok(Self::new(key.to_vec(), salt.to_vec()))
    }

    /// Generate random keying material for `suite`
    pub fn generate(suite: CipherSuite) -> Self {
        let mut rng = rand::thread_rng();
        let mut key = vec![0u8; suite.key_len()];
        let mut salt = vec![0u8; suite.salt_len()];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut salt);
        Self::new(key, salt)
    }

    /// Master key bytes
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Master salt bytes
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Concatenated key ‖ salt, the form signaling hands to the transport
    pub fn keying_material(&self) -> Vec<u8> {
        let mut material = Vec::with_capacity(self.key.len() + self.salt.len());
        material.extend_from_slice(&self.key);
        material.extend_from_slice(&self.salt);
        material
    }
}

impl fmt::Debug for SrtpCryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrtpCryptoKey")
            .field("key_len", &self.key.len())
            .field("salt_len", &self.salt.len())
            .finish()
    }
}

/// Authentication parameters handed to a downstream layer under external auth
#[derive(Clone, PartialEq, Eq)]
pub struct RtpAuthParams {
    /// Session authentication key
    pub key: Vec<u8>,

    /// Tag length the downstream layer must write
    pub tag_len: usize,
}

impl fmt::Debug for RtpAuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtpAuthParams")
            .field("key_len", &self.key.len())
            .field("tag_len", &self.tag_len)
            .finish()
    }
}

/// One direction of SRTP protection.
///
/// A session is configured exactly once, either for sending or for
/// receiving, and then transforms packets in place. Every transform either
/// succeeds completely or leaves the buffer untouched.
pub trait CryptoSession: Send {
    /// Install outbound key material
    fn set_send(&mut self, suite: CipherSuite, keying_material: &[u8]) -> Result<()>;

    /// Install inbound key material
    fn set_recv(&mut self, suite: CipherSuite, keying_material: &[u8]) -> Result<()>;

    /// Header extension ids whose values are encrypted
    fn set_encrypted_header_extension_ids(&mut self, ids: &[u8]);

    /// Skip local RTP tag computation; the tag is written downstream
    fn enable_external_auth(&mut self);

    /// External auth is enabled and the negotiated suite supports it
    fn is_external_auth_active(&self) -> bool;

    /// Protect the RTP packet occupying `buf[..len]`, writing the trailer
    /// into the rest of `buf`. Returns the protected length.
    fn protect_rtp(&mut self, buf: &mut [u8], len: usize) -> Result<usize>;

    /// Like [`CryptoSession::protect_rtp`], also returning the SRTP packet index
    fn protect_rtp_with_index(&mut self, buf: &mut [u8], len: usize) -> Result<(usize, u64)>;

    /// Protect the RTCP packet occupying `buf[..len]`
    fn protect_rtcp(&mut self, buf: &mut [u8], len: usize) -> Result<usize>;

    /// Verify and decrypt an SRTP packet. Returns the plaintext length.
    fn unprotect_rtp(&mut self, packet: &mut [u8]) -> Result<usize>;

    /// Verify and decrypt an SRTCP packet. Returns the plaintext length.
    fn unprotect_rtcp(&mut self, packet: &mut [u8]) -> Result<usize>;

    /// Authentication key and tag length of the outbound RTP stream
    fn rtp_auth_params(&self) -> Result<RtpAuthParams>;

    /// Bytes an SRTP packet grows by
    fn srtp_overhead(&self) -> usize;

    /// Bytes an SRTCP packet grows by
    fn srtcp_overhead(&self) -> usize;
}

/// Creates fresh crypto sessions for each activation
pub trait SessionFactory: Send {
    /// Create an unconfigured session
    fn create_session(&self) -> Box<dyn CryptoSession>;
}

impl<F> SessionFactory for F
where
    F: Fn() -> Box<dyn CryptoSession> + Send,
{
    fn create_session(&self) -> Box<dyn CryptoSession> {
        self()
    }
}

/// Factory for the default [`SrtpSession`]
#[derive(Debug, Clone, Copy)]
pub struct SrtpSessionFactory {
    replay_window_size: u64,
}

impl SrtpSessionFactory {
    /// Factory whose sessions use the given replay window
    pub fn new(replay_window_size: u64) -> Self {
        Self { replay_window_size }
    }
}

impl Default for SrtpSessionFactory {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_WINDOW_SIZE)
    }
}

impl SessionFactory for SrtpSessionFactory {
    fn create_session(&self) -> Box<dyn CryptoSession> {
        Box::new(SrtpSession::with_replay_window(self.replay_window_size))
    }
}
