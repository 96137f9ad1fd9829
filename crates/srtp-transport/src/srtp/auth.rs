use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::Error;
use crate::Result;

// Define type for HMAC-SHA1
type HmacSha1 = Hmac<Sha1>;

/// HMAC-SHA1 tag computation for SRTP and SRTCP
pub struct SrtpAuthenticator {
    /// Session authentication key
    auth_key: Vec<u8>,

    /// Authentication tag length in bytes
    tag_length: usize,
}

impl SrtpAuthenticator {
    /// Create a new SRTP authenticator
    pub fn new(auth_key: Vec<u8>, tag_length: usize) -> Self {
        Self { auth_key, tag_length }
    }

    /// Calculate the tag for an RTP packet: HMAC over packet ‖ ROC
    pub fn calculate_auth_tag(&self, packet_data: &[u8], roc: u32) -> Result<Vec<u8>> {
        self.calculate(&[packet_data, &roc.to_be_bytes()])
    }

    /// Calculate the tag for an RTCP packet. `packet_data` must already end
    /// with the E flag and SRTCP index.
    pub fn calculate_rtcp_auth_tag(&self, packet_data: &[u8]) -> Result<Vec<u8>> {
        self.calculate(&[packet_data])
    }

    /// Verify the tag of an RTP packet
    pub fn verify_auth_tag(&self, packet_data: &[u8], tag: &[u8], roc: u32) -> Result<bool> {
        let expected = self.calculate_auth_tag(packet_data, roc)?;
        Ok(constant_time_eq(&expected, tag))
    }

    /// Verify the tag of an RTCP packet
    pub fn verify_rtcp_auth_tag(&self, packet_data: &[u8], tag: &[u8]) -> Result<bool> {
        let expected = self.calculate_rtcp_auth_tag(packet_data)?;
        Ok(constant_time_eq(&expected, tag))
    }

    /// Get the authentication tag length
    pub fn tag_length(&self) -> usize {
        self.tag_length
    }

    /// Session authentication key
    pub fn auth_key(&self) -> &[u8] {
        &self.auth_key
    }

    fn calculate(&self, parts: &[&[u8]]) -> Result<Vec<u8>> {
        let mut mac = HmacSha1::new_from_slice(&self.auth_key)
            .map_err(|e| Error::Crypto(format!("Failed to create HMAC: {}", e)))?;
        for part in parts {
            mac.update(part);
        }
        let result = mac.finalize().into_bytes();

        if self.tag_length > result.len() {
            return Err(Error::Crypto(format!(
                "Authentication tag length {} exceeds HMAC-SHA1 output",
                self.tag_length
            )));
        }
        Ok(result[..self.tag_length].to_vec())
    }
}

/// Compare without early exit so timing does not leak the mismatch position
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Largest replay window a receive stream will allocate
pub const MAX_REPLAY_WINDOW_SIZE: u64 = 0x8000;

/// Sliding window of recently accepted packet indices.
///
/// Checking and recording are separate steps so a packet is only recorded
/// after it authenticates.
#[derive(Debug, Clone)]
pub struct SrtpReplayProtection {
    /// Window size in packets
    window_size: u64,

    /// Highest index accepted so far
    highest: Option<u64>,

    /// Ring of received flags, slot `index % window_size`
    window: Vec<bool>,
}

impl SrtpReplayProtection {
    /// Create a new replay protection context.
    ///
    /// The size is clamped to `1..=MAX_REPLAY_WINDOW_SIZE`.
    pub fn new(window_size: u64) -> Self {
        let window_size = window_size.clamp(1, MAX_REPLAY_WINDOW_SIZE);
        Self {
            window_size,
            highest: None,
            window: vec![false; window_size as usize],
        }
    }

    /// True if `index` has not been seen and is not older than the window
    pub fn check(&self, index: u64) -> bool {
        let highest = match self.highest {
            Some(highest) => highest,
            None => return true,
        };
        if index > highest {
            return true;
        }
        if highest - index >= self.window_size {
            return false;
        }
        !self.window[self.slot(index)]
    }

    /// Record `index` as received, sliding the window forward if needed
    pub fn update(&mut self, index: u64) {
        match self.highest {
            None => {
                self.window.iter_mut().for_each(|seen| *seen = false);
                self.highest = Some(index);
            }
            Some(highest) if index > highest => {
                let diff = index - highest;
                if diff >= self.window_size {
                    self.window.iter_mut().for_each(|seen| *seen = false);
                } else {
                    // Slots that now stand for the new indices are stale
                    for i in 1..=diff {
                        let slot = self.slot(highest + i);
                        self.window[slot] = false;
                    }
                }
                self.highest = Some(index);
            }
            Some(highest) if highest - index >= self.window_size => return,
            Some(_) => {}
        }
        let slot = self.slot(index);
        self.window[slot] = true;
    }

    /// Highest index recorded so far
    pub fn highest(&self) -> Option<u64> {
        self.highest
    }

    fn slot(&self, index: u64) -> usize {
        (index % self.window_size) as usize
    }
}
