use std::fmt;

use crate::error::Error;
use crate::Result;
use super::cipher::aes_cm_keystream;
use super::{CipherSuite, SrtpCryptoKey};

/// Length of the HMAC-SHA1 session authentication key
pub const AUTH_KEY_LEN: usize = 20;

/// Label values for SRTP key derivation (RFC 3711 section 4.3, RFC 6904)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDerivationLabel {
    /// RTP encryption key
    RtpEncryption = 0,

    /// RTP authentication key
    RtpAuthentication = 1,

    /// RTP salt (for IV creation)
    RtpSalt = 2,

    /// RTCP encryption key
    RtcpEncryption = 3,

    /// RTCP authentication key
    RtcpAuthentication = 4,

    /// RTCP salt (for IV creation)
    RtcpSalt = 5,

    /// Header extension encryption key
    RtpHeaderEncryption = 6,

    /// Header extension salt
    RtpHeaderSalt = 7,
}

/// Perform the AES-CM key derivation function of RFC 3711 section 4.3.3.
///
/// The key derivation rate is zero, so `r` is always zero and the label
/// alone selects the output. Salts shorter than 112 bits (the GCM suites)
/// are zero-padded on the right.
pub fn srtp_kdf(
    master_key: &SrtpCryptoKey,
    label: KeyDerivationLabel,
    output_len: usize,
) -> Result<Vec<u8>> {
    let salt = master_key.salt();
    if salt.len() > 14 {
        return Err(Error::InvalidKey(format!(
            "Salt too long: expected at most 14 bytes, got {}",
            salt.len()
        )));
    }

    // x = key_id XOR master_salt, key_id = label ‖ r right-aligned in 112 bits
    let mut iv = [0u8; 16];
    iv[..salt.len()].copy_from_slice(salt);
    iv[7] ^= label as u8;

    let mut output = vec![0u8; output_len];
    aes_cm_keystream(master_key.key(), &iv, &mut output)?;
    Ok(output)
}

/// Session keys derived for one media type
#[derive(Clone)]
pub struct SessionKeys {
    /// Session encryption key
    pub cipher_key: Vec<u8>,

    /// Session authentication key (empty for AEAD suites)
    pub auth_key: Vec<u8>,

    /// Session salt
    pub salt: Vec<u8>,
}

impl SessionKeys {
    /// Derive the SRTP session keys
    pub fn derive_rtp(suite: CipherSuite, master_key: &SrtpCryptoKey) -> Result<Self> {
        Self::derive(
            suite,
            master_key,
            KeyDerivationLabel::RtpEncryption,
            Some(KeyDerivationLabel::RtpAuthentication),
            KeyDerivationLabel::RtpSalt,
        )
    }

    /// Derive the SRTCP session keys
    pub fn derive_rtcp(suite: CipherSuite, master_key: &SrtpCryptoKey) -> Result<Self> {
        Self::derive(
            suite,
            master_key,
            KeyDerivationLabel::RtcpEncryption,
            Some(KeyDerivationLabel::RtcpAuthentication),
            KeyDerivationLabel::RtcpSalt,
        )
    }

    /// Derive the keys used to encrypt RTP header extension values
    pub fn derive_rtp_header(suite: CipherSuite, master_key: &SrtpCryptoKey) -> Result<Self> {
        Self::derive(
            suite,
            master_key,
            KeyDerivationLabel::RtpHeaderEncryption,
            None,
            KeyDerivationLabel::RtpHeaderSalt,
        )
    }

    fn derive(
        suite: CipherSuite,
        master_key: &SrtpCryptoKey,
        cipher_label: KeyDerivationLabel,
        auth_label: Option<KeyDerivationLabel>,
        salt_label: KeyDerivationLabel,
    ) -> Result<Self> {
        let cipher_key = srtp_kdf(master_key, cipher_label, suite.key_len())?;
        let auth_key = match auth_label {
            Some(label) if !suite.is_aead() => srtp_kdf(master_key, label, AUTH_KEY_LEN)?,
            _ => Vec::new(),
        };
        let salt = srtp_kdf(master_key, salt_label, suite.salt_len())?;

        Ok(Self { cipher_key, auth_key, salt })
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("cipher_key_len", &self.cipher_key.len())
            .field("auth_key_len", &self.auth_key.len())
            .field("salt_len", &self.salt.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rfc3711_master_key() -> SrtpCryptoKey {
        SrtpCryptoKey::new(
            vec![
                0xE1, 0xF9, 0x7A, 0x0D, 0x3E, 0x01, 0x8B, 0xE0,
                0xD6, 0x4F, 0xA3, 0x2C, 0x06, 0xDE, 0x41, 0x39,
            ],
            vec![
                0x0E, 0xC6, 0x75, 0xAD, 0x49, 0x8A, 0xFE, 0xEB,
                0xB6, 0x96, 0x0B, 0x3A, 0xAB, 0xE6,
            ],
        )
    }

    #[test]
    fn test_rfc3711_key_derivation_vectors() {
        // RFC 3711 appendix B.3
        let keys = SessionKeys::derive_rtp(CipherSuite::AesCm128HmacSha1_80, &rfc3711_master_key()).unwrap();

        assert_eq!(
            keys.cipher_key,
            vec![
                0xC6, 0x1E, 0x7A, 0x93, 0x74, 0x4F, 0x39, 0xEE,
                0x10, 0x73, 0x4A, 0xFE, 0x3F, 0xF7, 0xA0, 0x87,
            ]
        );
        assert_eq!(
            keys.salt,
            vec![
                0x30, 0xCB, 0xBC, 0x08, 0x86, 0x3D, 0x8C, 0x85,
                0xD4, 0x9D, 0xB3, 0x4A, 0x9A, 0xE1,
            ]
        );
        assert_eq!(
            keys.auth_key,
            vec![
                0xCE, 0xBE, 0x32, 0x1F, 0x6F, 0xF7, 0x71, 0x6B,
                0x6F, 0xD4, 0xAB, 0x49, 0xAF, 0x25, 0x6A, 0x15,
                0x6D, 0x38, 0xBA, 0xA4,
            ]
        );
    }

    #[test]
    fn test_rtcp_keys_differ_from_rtp() {
        let master = rfc3711_master_key();
        let rtp = SessionKeys::derive_rtp(CipherSuite::AesCm128HmacSha1_80, &master).unwrap();
        let rtcp = SessionKeys::derive_rtcp(CipherSuite::AesCm128HmacSha1_80, &master).unwrap();

        assert_ne!(rtp.cipher_key, rtcp.cipher_key);
        assert_ne!(rtp.auth_key, rtcp.auth_key);
        assert_ne!(rtp.salt, rtcp.salt);
    }

    #[test]
    fn test_gcm_key_lengths() {
        let master = SrtpCryptoKey::new(vec![5; 32], vec![6; 12]);
        let keys = SessionKeys::derive_rtp(CipherSuite::AeadAes256Gcm, &master).unwrap();
        assert_eq!(keys.cipher_key.len(), 32);
        assert_eq!(keys.salt.len(), 12);
        assert!(keys.auth_key.is_empty());

        let header = SessionKeys::derive_rtp_header(CipherSuite::AeadAes256Gcm, &master).unwrap();
        assert_ne!(header.cipher_key, keys.cipher_key);
    }

    #[test]
    fn test_salt_too_long() {
        let master = SrtpCryptoKey::new(vec![0; 16], vec![0; 15]);
        assert!(srtp_kdf(&master, KeyDerivationLabel::RtpSalt, 14).is_err());
    }
}
