//! AES counter mode and AES-GCM helpers
//!
//! IV layouts follow RFC 3711 section 4.1.1 (counter mode) and RFC 7714
//! sections 8.1 and 9.1 (GCM).

use aes::cipher::{KeyIvInit, StreamCipher};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm};

use crate::error::Error;
use crate::Result;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;
type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// GCM authentication tag length
pub const AEAD_TAG_LEN: usize = 16;

/// XOR the AES-CM keystream for `key`/`iv` into `data`
pub fn aes_cm_keystream(key: &[u8], iv: &[u8; 16], data: &mut [u8]) -> Result<()> {
    match key.len() {
        16 => {
            let mut cipher = Aes128Ctr::new_from_slices(key, iv)
                .map_err(|e| Error::InvalidKey(format!("AES-128-CM init failed: {}", e)))?;
            cipher.apply_keystream(data);
        }
        32 => {
            let mut cipher = Aes256Ctr::new_from_slices(key, iv)
                .map_err(|e| Error::InvalidKey(format!("AES-256-CM init failed: {}", e)))?;
            cipher.apply_keystream(data);
        }
        other => {
            return Err(Error::InvalidKey(format!("unsupported AES key length {}", other)));
        }
    }
    Ok(())
}

/// Counter mode IV: salt XOR (SSRC ‖ 48-bit packet index), shifted left 16 bits.
///
/// SRTCP uses the same layout with the 31-bit SRTCP index as packet index.
pub fn srtp_iv(salt: &[u8], ssrc: u32, index: u64) -> [u8; 16] {
    let mut iv = [0u8; 16];
    iv[4..8].copy_from_slice(&ssrc.to_be_bytes());
    iv[8..14].copy_from_slice(&index.to_be_bytes()[2..8]);
    for (byte, salt_byte) in iv.iter_mut().zip(salt.iter().take(14)) {
        *byte ^= salt_byte;
    }
    iv
}

/// GCM IV for SRTP: salt XOR (0x0000 ‖ SSRC ‖ ROC ‖ SEQ)
pub fn gcm_rtp_iv(salt: &[u8], ssrc: u32, roc: u32, seq: u16) -> [u8; 12] {
    let mut iv = [0u8; 12];
    iv[2..6].copy_from_slice(&ssrc.to_be_bytes());
    iv[6..10].copy_from_slice(&roc.to_be_bytes());
    iv[10..12].copy_from_slice(&seq.to_be_bytes());
    for (byte, salt_byte) in iv.iter_mut().zip(salt.iter()) {
        *byte ^= salt_byte;
    }
    iv
}

/// GCM IV for SRTCP: salt XOR (0x0000 ‖ SSRC ‖ 0x0000 ‖ 0 ‖ 31-bit index)
pub fn gcm_rtcp_iv(salt: &[u8], ssrc: u32, index: u32) -> [u8; 12] {
    let mut iv = [0u8; 12];
    iv[2..6].copy_from_slice(&ssrc.to_be_bytes());
    iv[8..12].copy_from_slice(&(index & 0x7FFF_FFFF).to_be_bytes());
    for (byte, salt_byte) in iv.iter_mut().zip(salt.iter()) {
        *byte ^= salt_byte;
    }
    iv
}

/// AES-GCM with a 128 or 256 bit session key
pub enum AeadCipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl AeadCipher {
    /// Create a cipher from a derived session key
    pub fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key)
                .map(AeadCipher::Aes128)
                .map_err(|e| Error::InvalidKey(format!("AES-128-GCM init failed: {}", e))),
            32 => Aes256Gcm::new_from_slice(key)
                .map(AeadCipher::Aes256)
                .map_err(|e| Error::InvalidKey(format!("AES-256-GCM init failed: {}", e))),
            other => Err(Error::InvalidKey(format!("unsupported AES-GCM key length {}", other))),
        }
    }

    /// Encrypt `data` in place and return the detached tag
    pub fn seal(&self, iv: &[u8; 12], aad: &[u8], data: &mut [u8]) -> Result<[u8; AEAD_TAG_LEN]> {
        let nonce = GenericArray::from_slice(iv);
        let tag = match self {
            AeadCipher::Aes128(cipher) => cipher.encrypt_in_place_detached(nonce, aad, data),
            AeadCipher::Aes256(cipher) => cipher.encrypt_in_place_detached(nonce, aad, data),
        }
        .map_err(|_| Error::Crypto("AES-GCM encryption failed".to_string()))?;

        let mut out = [0u8; AEAD_TAG_LEN];
        out.copy_from_slice(&tag);
        Ok(out)
    }

    /// Verify `tag` and decrypt `data` in place. `data` is untouched on failure.
    pub fn open(&self, iv: &[u8; 12], aad: &[u8], data: &mut [u8], tag: &[u8; AEAD_TAG_LEN]) -> Result<()> {
        let nonce = GenericArray::from_slice(iv);
        let tag = GenericArray::from_slice(tag);
        match self {
            AeadCipher::Aes128(cipher) => cipher.decrypt_in_place_detached(nonce, aad, data, tag),
            AeadCipher::Aes256(cipher) => cipher.decrypt_in_place_detached(nonce, aad, data, tag),
        }
        .map_err(|_| Error::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srtp_iv_layout() {
        let iv = srtp_iv(&[0u8; 14], 0x0102_0304, 0x0000_0506_0708);
        assert_eq!(iv, [0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 5, 6, 7, 8, 0, 0]);

        let iv = srtp_iv(&[0xFF; 14], 0, 0);
        assert_eq!(&iv[..14], &[0xFF; 14]);
        assert_eq!(&iv[14..], &[0, 0]);
    }

    #[test]
    fn test_gcm_iv_layout() {
        let iv = gcm_rtp_iv(&[0u8; 12], 0xAABB_CCDD, 1, 2);
        assert_eq!(iv, [0, 0, 0xAA, 0xBB, 0xCC, 0xDD, 0, 0, 0, 1, 0, 2]);

        let iv = gcm_rtcp_iv(&[0u8; 12], 0xAABB_CCDD, 0x8000_0003);
        assert_eq!(iv, [0, 0, 0xAA, 0xBB, 0xCC, 0xDD, 0, 0, 0, 0, 0, 3]);
    }

    #[test]
    fn test_keystream_is_symmetric() {
        let key = [7u8; 16];
        let iv = srtp_iv(&[1u8; 14], 42, 1000);
        let mut data = b"secret media payload".to_vec();

        aes_cm_keystream(&key, &iv, &mut data).unwrap();
        assert_ne!(data.as_slice(), b"secret media payload");
        aes_cm_keystream(&key, &iv, &mut data).unwrap();
        assert_eq!(data.as_slice(), b"secret media payload");

        assert!(aes_cm_keystream(&[0u8; 10], &iv, &mut data).is_err());
    }

    #[test]
    fn test_aead_rejects_modified_data() {
        let cipher = AeadCipher::new(&[3u8; 32]).unwrap();
        let iv = [9u8; 12];
        let mut data = b"hello gcm".to_vec();

        let tag = cipher.seal(&iv, b"header", &mut data).unwrap();
        let sealed = data.clone();

        assert_eq!(cipher.open(&iv, b"other", &mut data, &tag), Err(Error::AuthenticationFailed));
        assert_eq!(data, sealed);

        cipher.open(&iv, b"header", &mut data, &tag).unwrap();
        assert_eq!(data.as_slice(), b"hello gcm");
    }
}
