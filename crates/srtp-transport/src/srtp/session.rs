//! Default [`CryptoSession`] implementation
//!
//! Packet layouts:
//!
//! * SRTP (all suites): `header ‖ encrypted payload ‖ tag`
//! * SRTCP, HMAC suites: `header ‖ encrypted payload ‖ E|index ‖ tag`
//! * SRTCP, GCM suites: `header ‖ encrypted payload ‖ tag ‖ E|index`
//!
//! HMAC suites authenticate after encrypting; GCM authenticates the header
//! (and for SRTCP the E|index word) as associated data. Inbound packets are
//! always verified before anything is decrypted, and per-stream state is
//! only committed once a packet verifies.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace, warn};

use crate::error::Error;
use crate::packet::{self, RTCP_HEADER_LEN, RTP_FIXED_HEADER_LEN};
use crate::Result;
use super::auth::{SrtpAuthenticator, SrtpReplayProtection};
use super::cipher::{self, AeadCipher, AEAD_TAG_LEN};
use super::key_derivation::SessionKeys;
use super::{CipherSuite, CryptoSession, RtpAuthParams, SrtpCryptoKey};

/// Default number of packets remembered for replay detection
pub const DEFAULT_REPLAY_WINDOW_SIZE: u64 = 1024;

/// Length of the E flag and SRTCP index word
const SRTCP_INDEX_LEN: usize = 4;

/// Encryption flag in the SRTCP index word
const SRTCP_E_FLAG: u32 = 0x8000_0000;

const SRTCP_INDEX_MASK: u32 = 0x7FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Send,
    Recv,
}

/// Transforms for one media type (RTP or RTCP)
struct StreamCrypto {
    keys: SessionKeys,
    authenticator: SrtpAuthenticator,
    aead: Option<AeadCipher>,
}

impl StreamCrypto {
    fn new(suite: CipherSuite, keys: SessionKeys, tag_len: usize) -> Result<Self> {
        let aead = if suite.is_aead() {
            Some(AeadCipher::new(&keys.cipher_key)?)
        } else {
            None
        };
        let authenticator = SrtpAuthenticator::new(keys.auth_key.clone(), tag_len);
        Ok(Self { keys, authenticator, aead })
    }

    fn aead(&self) -> Result<&AeadCipher> {
        self.aead
            .as_ref()
            .ok_or_else(|| Error::Crypto("AEAD cipher not initialized".to_string()))
    }
}

/// Everything fixed when the session is configured
struct Configured {
    suite: CipherSuite,
    direction: Direction,
    rtp: StreamCrypto,
    rtcp: StreamCrypto,
    header: SessionKeys,
}

/// Outbound RTP stream state
#[derive(Debug, Default, Clone, Copy)]
struct SendStream {
    roc: u32,
    last_seq: Option<u16>,
}

/// Inbound RTP stream state
#[derive(Debug, Clone)]
struct RecvStream {
    roc: u32,
    highest_seq: u16,
    replay: SrtpReplayProtection,
}

/// SRTP session for one direction.
///
/// Keeps per-SSRC rollover counters and replay windows, so one session can
/// carry several streams.
pub struct SrtpSession {
    config: Option<Configured>,
    replay_window_size: u64,
    encrypted_header_extension_ids: Vec<u8>,
    external_auth_enabled: bool,
    send_streams: HashMap<u32, SendStream>,
    recv_streams: HashMap<u32, RecvStream>,
    rtcp_send_index: HashMap<u32, u32>,
    rtcp_recv_replay: HashMap<u32, SrtpReplayProtection>,
}

impl SrtpSession {
    /// Create an unconfigured session with the default replay window
    pub fn new() -> Self {
        Self::with_replay_window(DEFAULT_REPLAY_WINDOW_SIZE)
    }

    /// Create an unconfigured session with a custom replay window
    pub fn with_replay_window(replay_window_size: u64) -> Self {
        Self {
            config: None,
            replay_window_size,
            encrypted_header_extension_ids: Vec::new(),
            external_auth_enabled: false,
            send_streams: HashMap::new(),
            recv_streams: HashMap::new(),
            rtcp_send_index: HashMap::new(),
            rtcp_recv_replay: HashMap::new(),
        }
    }

    /// Negotiated suite, once configured
    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        self.config.as_ref().map(|config| config.suite)
    }

    fn configure(&mut self, direction: Direction, suite: CipherSuite, keying_material: &[u8]) -> Result<()> {
        if let Some(existing) = &self.config {
            return Err(Error::ConfigurationConflict(format!(
                "SRTP session already configured for {:?} with {}",
                existing.direction, existing.suite
            )));
        }

        let master = SrtpCryptoKey::from_keying_material(suite, keying_material)?;
        let rtp = StreamCrypto::new(
            suite,
            SessionKeys::derive_rtp(suite, &master)?,
            suite.rtp_auth_tag_len(),
        )?;
        let rtcp = StreamCrypto::new(
            suite,
            SessionKeys::derive_rtcp(suite, &master)?,
            suite.rtcp_auth_tag_len(),
        )?;
        let header = SessionKeys::derive_rtp_header(suite, &master)?;

        self.config = Some(Configured { suite, direction, rtp, rtcp, header });
        debug!("SRTP session configured for {:?} with {}", direction, suite);
        Ok(())
    }
}

impl Default for SrtpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SrtpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrtpSession")
            .field("suite", &self.cipher_suite())
            .field("direction", &self.config.as_ref().map(|config| config.direction))
            .field("external_auth_enabled", &self.external_auth_enabled)
            .field("streams", &(self.send_streams.len() + self.recv_streams.len()))
            .finish()
    }
}

fn configured(config: &Option<Configured>, direction: Direction) -> Result<&Configured> {
    match config {
        Some(config) if config.direction == direction => Ok(config),
        Some(config) => Err(Error::Crypto(format!(
            "SRTP session is configured for {:?}, not {:?}",
            config.direction, direction
        ))),
        None => Err(Error::Inactive),
    }
}

/// Estimate the ROC of an incoming packet (RFC 3711, appendix A)
fn estimate_roc(roc: u32, highest_seq: u16, seq: u16) -> u32 {
    let (s_l, seq) = (highest_seq as i32, seq as i32);
    if s_l < 0x8000 {
        if seq - s_l > 0x8000 {
            roc.saturating_sub(1)
        } else {
            roc
        }
    } else if s_l - 0x8000 > seq {
        roc.wrapping_add(1)
    } else {
        roc
    }
}

fn packet_index(roc: u32, seq: u16) -> u64 {
    ((roc as u64) << 16) | seq as u64
}

/// XOR the header-key keystream into the selected extension values.
///
/// The keystream is aligned to the start of the packet so the same bytes
/// are produced on both ends; only bytes of the listed elements change.
fn transform_header_extensions(
    keys: &SessionKeys,
    ids: &[u8],
    header: &mut [u8],
    ssrc: u32,
    index: u64,
) -> Result<()> {
    let elements: Vec<_> = packet::rtp_header_extension_elements(header)
        .into_iter()
        .filter(|element| ids.contains(&element.id))
        .collect();
    if elements.is_empty() {
        return Ok(());
    }

    let mut keystream = vec![0u8; header.len()];
    cipher::aes_cm_keystream(
        &keys.cipher_key,
        &cipher::srtp_iv(&keys.salt, ssrc, index),
        &mut keystream,
    )?;
    for element in elements {
        for i in element.data {
            header[i] ^= keystream[i];
        }
    }
    Ok(())
}

impl CryptoSession for SrtpSession {
    fn set_send(&mut self, suite: CipherSuite, keying_material: &[u8]) -> Result<()> {
        self.configure(Direction::Send, suite, keying_material)
    }

    fn set_recv(&mut self, suite: CipherSuite, keying_material: &[u8]) -> Result<()> {
        self.configure(Direction::Recv, suite, keying_material)
    }

    fn set_encrypted_header_extension_ids(&mut self, ids: &[u8]) {
        self.encrypted_header_extension_ids = ids.to_vec();
    }

    fn enable_external_auth(&mut self) {
        self.external_auth_enabled = true;
    }

    fn is_external_auth_active(&self) -> bool {
        self.external_auth_enabled
            && matches!(
                &self.config,
                Some(config) if config.direction == Direction::Send && config.suite.supports_external_auth()
            )
    }

    fn protect_rtp(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        self.protect_rtp_with_index(buf, len).map(|(len, _)| len)
    }

    fn protect_rtp_with_index(&mut self, buf: &mut [u8], len: usize) -> Result<(usize, u64)> {
        let config = configured(&self.config, Direction::Send)?;
        let suite = config.suite;
        let tag_len = suite.rtp_auth_tag_len();

        if len > buf.len() {
            return Err(Error::InvalidPacket(format!(
                "packet length {} exceeds buffer of {} bytes",
                len,
                buf.len()
            )));
        }
        let header_len = packet::rtp_header_len(&buf[..len])
            .ok_or_else(|| Error::InvalidPacket(format!("malformed RTP header ({} bytes)", len)))?;
        let required = len + tag_len;
        if required > buf.len() {
            return Err(Error::BufferTooSmall { required, available: buf.len() });
        }

        let ssrc = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let seq = u16::from_be_bytes([buf[2], buf[3]]);

        let stream = self.send_streams.get(&ssrc).copied().unwrap_or_default();
        let mut roc = stream.roc;
        if let Some(last_seq) = stream.last_seq {
            if seq < last_seq && last_seq - seq > 0x8000 {
                roc = roc.wrapping_add(1);
            }
        }
        let index = packet_index(roc, seq);

        if !self.encrypted_header_extension_ids.is_empty() {
            transform_header_extensions(
                &config.header,
                &self.encrypted_header_extension_ids,
                &mut buf[..header_len],
                ssrc,
                index,
            )?;
        }

        if suite.is_aead() {
            let iv = cipher::gcm_rtp_iv(&config.rtp.keys.salt, ssrc, roc, seq);
            let (header, rest) = buf.split_at_mut(header_len);
            let tag = config.rtp.aead()?.seal(&iv, header, &mut rest[..len - header_len])?;
            buf[len..required].copy_from_slice(&tag);
        } else {
            let iv = cipher::srtp_iv(&config.rtp.keys.salt, ssrc, index);
            cipher::aes_cm_keystream(&config.rtp.keys.cipher_key, &iv, &mut buf[header_len..len])?;

            if self.external_auth_enabled {
                // Written downstream by apply_packet_time_params
                buf[len..required].fill(0);
            } else {
                let tag = config.rtp.authenticator.calculate_auth_tag(&buf[..len], roc)?;
                buf[len..required].copy_from_slice(&tag);
            }
        }

        let entry = self.send_streams.entry(ssrc).or_default();
        let newer = match entry.last_seq {
            Some(last_seq) => index > packet_index(entry.roc, last_seq),
            None => true,
        };
        if newer {
            entry.roc = roc;
            entry.last_seq = Some(seq);
        }

        trace!("Protected RTP packet ssrc={:08x} seq={} index={} len={}", ssrc, seq, index, required);
        Ok((required, index))
    }

    fn protect_rtcp(&mut self, buf: &mut [u8], len: usize) -> Result<usize> {
        let config = configured(&self.config, Direction::Send)?;
        let suite = config.suite;
        let tag_len = suite.rtcp_auth_tag_len();

        if len > buf.len() || len < RTCP_HEADER_LEN {
            return Err(Error::InvalidPacket(format!("RTCP packet too short: {} bytes", len)));
        }
        let required = len + SRTCP_INDEX_LEN + tag_len;
        if required > buf.len() {
            return Err(Error::BufferTooSmall { required, available: buf.len() });
        }

        let ssrc = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let index = self.rtcp_send_index.get(&ssrc).copied().unwrap_or(0);
        let e_index = (SRTCP_E_FLAG | (index & SRTCP_INDEX_MASK)).to_be_bytes();

        if suite.is_aead() {
            let iv = cipher::gcm_rtcp_iv(&config.rtcp.keys.salt, ssrc, index);
            let mut aad = [0u8; RTCP_HEADER_LEN + SRTCP_INDEX_LEN];
            aad[..RTCP_HEADER_LEN].copy_from_slice(&buf[..RTCP_HEADER_LEN]);
            aad[RTCP_HEADER_LEN..].copy_from_slice(&e_index);

            let tag = config.rtcp.aead()?.seal(&iv, &aad, &mut buf[RTCP_HEADER_LEN..len])?;
            buf[len..len + AEAD_TAG_LEN].copy_from_slice(&tag);
            buf[len + AEAD_TAG_LEN..required].copy_from_slice(&e_index);
        } else {
            let iv = cipher::srtp_iv(&config.rtcp.keys.salt, ssrc, index as u64);
            cipher::aes_cm_keystream(&config.rtcp.keys.cipher_key, &iv, &mut buf[RTCP_HEADER_LEN..len])?;
            buf[len..len + SRTCP_INDEX_LEN].copy_from_slice(&e_index);

            let tag = config
                .rtcp
                .authenticator
                .calculate_rtcp_auth_tag(&buf[..len + SRTCP_INDEX_LEN])?;
            buf[len + SRTCP_INDEX_LEN..required].copy_from_slice(&tag);
        }

        self.rtcp_send_index.insert(ssrc, index.wrapping_add(1) & SRTCP_INDEX_MASK);

        trace!("Protected RTCP packet ssrc={:08x} index={} len={}", ssrc, index, required);
        Ok(required)
    }

    fn unprotect_rtp(&mut self, packet: &mut [u8]) -> Result<usize> {
        let config = configured(&self.config, Direction::Recv)?;
        let suite = config.suite;
        let tag_len = suite.rtp_auth_tag_len();

        let len = packet.len();
        if len < RTP_FIXED_HEADER_LEN + tag_len {
            return Err(Error::InvalidPacket(format!("SRTP packet too short: {} bytes", len)));
        }
        let auth_end = len - tag_len;
        let header_len = packet::rtp_header_len(&packet[..auth_end])
            .ok_or_else(|| Error::InvalidPacket("malformed SRTP header".to_string()))?;

        let ssrc = u32::from_be_bytes([packet[8], packet[9], packet[10], packet[11]]);
        let seq = u16::from_be_bytes([packet[2], packet[3]]);

        let roc = match self.recv_streams.get(&ssrc) {
            Some(stream) => estimate_roc(stream.roc, stream.highest_seq, seq),
            None => 0,
        };
        let index = packet_index(roc, seq);

        if let Some(stream) = self.recv_streams.get(&ssrc) {
            if !stream.replay.check(index) {
                debug!("Replayed SRTP packet ssrc={:08x} index={}", ssrc, index);
                return Err(Error::ReplayDetected(index));
            }
        }

        if suite.is_aead() {
            let mut tag = [0u8; AEAD_TAG_LEN];
            tag.copy_from_slice(&packet[auth_end..]);
            let iv = cipher::gcm_rtp_iv(&config.rtp.keys.salt, ssrc, roc, seq);
            let (header, rest) = packet.split_at_mut(header_len);
            config.rtp.aead()?.open(&iv, header, &mut rest[..auth_end - header_len], &tag)?;
        } else {
            let (authenticated, tag) = packet.split_at(auth_end);
            if !config.rtp.authenticator.verify_auth_tag(authenticated, tag, roc)? {
                return Err(Error::AuthenticationFailed);
            }
            let iv = cipher::srtp_iv(&config.rtp.keys.salt, ssrc, index);
            cipher::aes_cm_keystream(&config.rtp.keys.cipher_key, &iv, &mut packet[header_len..auth_end])?;
        }

        if !self.encrypted_header_extension_ids.is_empty() {
            transform_header_extensions(
                &config.header,
                &self.encrypted_header_extension_ids,
                &mut packet[..header_len],
                ssrc,
                index,
            )?;
        }

        let window = self.replay_window_size;
        let stream = self.recv_streams.entry(ssrc).or_insert_with(|| RecvStream {
            roc,
            highest_seq: seq,
            replay: SrtpReplayProtection::new(window),
        });
        if index >= packet_index(stream.roc, stream.highest_seq) {
            stream.roc = roc;
            stream.highest_seq = seq;
        }
        stream.replay.update(index);

        trace!("Unprotected SRTP packet ssrc={:08x} seq={} index={}", ssrc, seq, index);
        Ok(auth_end)
    }

    fn unprotect_rtcp(&mut self, packet: &mut [u8]) -> Result<usize> {
        let config = configured(&self.config, Direction::Recv)?;
        let suite = config.suite;
        let tag_len = suite.rtcp_auth_tag_len();

        let len = packet.len();
        if len < RTCP_HEADER_LEN + SRTCP_INDEX_LEN + tag_len {
            return Err(Error::InvalidPacket(format!("SRTCP packet too short: {} bytes", len)));
        }

        let (payload_end, index_pos) = if suite.is_aead() {
            (len - SRTCP_INDEX_LEN - AEAD_TAG_LEN, len - SRTCP_INDEX_LEN)
        } else {
            (len - tag_len - SRTCP_INDEX_LEN, len - tag_len - SRTCP_INDEX_LEN)
        };
        let e_index_bytes = [
            packet[index_pos],
            packet[index_pos + 1],
            packet[index_pos + 2],
            packet[index_pos + 3],
        ];
        let e_index = u32::from_be_bytes(e_index_bytes);
        let encrypted = e_index & SRTCP_E_FLAG != 0;
        let index = e_index & SRTCP_INDEX_MASK;
        let ssrc = u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]);

        if let Some(replay) = self.rtcp_recv_replay.get(&ssrc) {
            if !replay.check(index as u64) {
                debug!("Replayed SRTCP packet ssrc={:08x} index={}", ssrc, index);
                return Err(Error::ReplayDetected(index as u64));
            }
        }

        if suite.is_aead() {
            if !encrypted {
                warn!("Rejecting unencrypted SRTCP packet for AEAD suite {}", suite);
                return Err(Error::Crypto("unencrypted SRTCP is not supported with AEAD".to_string()));
            }
            let mut tag = [0u8; AEAD_TAG_LEN];
            tag.copy_from_slice(&packet[payload_end..index_pos]);
            let mut aad = [0u8; RTCP_HEADER_LEN + SRTCP_INDEX_LEN];
            aad[..RTCP_HEADER_LEN].copy_from_slice(&packet[..RTCP_HEADER_LEN]);
            aad[RTCP_HEADER_LEN..].copy_from_slice(&e_index_bytes);

            let iv = cipher::gcm_rtcp_iv(&config.rtcp.keys.salt, ssrc, index);
            config
                .rtcp
                .aead()?
                .open(&iv, &aad, &mut packet[RTCP_HEADER_LEN..payload_end], &tag)?;
        } else {
            let (authenticated, tag) = packet.split_at(len - tag_len);
            if !config.rtcp.authenticator.verify_rtcp_auth_tag(authenticated, tag)? {
                return Err(Error::AuthenticationFailed);
            }
            if encrypted {
                let iv = cipher::srtp_iv(&config.rtcp.keys.salt, ssrc, index as u64);
                cipher::aes_cm_keystream(
                    &config.rtcp.keys.cipher_key,
                    &iv,
                    &mut packet[RTCP_HEADER_LEN..payload_end],
                )?;
            }
        }

        let window = self.replay_window_size;
        self.rtcp_recv_replay
            .entry(ssrc)
            .or_insert_with(|| SrtpReplayProtection::new(window))
            .update(index as u64);

        trace!("Unprotected SRTCP packet ssrc={:08x} index={}", ssrc, index);
        Ok(payload_end)
    }

    fn rtp_auth_params(&self) -> Result<RtpAuthParams> {
        let config = configured(&self.config, Direction::Send)?;
        if !config.suite.supports_external_auth() {
            return Err(Error::Crypto(format!(
                "{} does not expose an authentication key",
                config.suite
            )));
        }
        Ok(RtpAuthParams {
            key: config.rtp.authenticator.auth_key().to_vec(),
            tag_len: config.rtp.authenticator.tag_length(),
        })
    }

    fn srtp_overhead(&self) -> usize {
        self.config
            .as_ref()
            .map(|config| config.suite.rtp_auth_tag_len())
            .unwrap_or(0)
    }

    fn srtcp_overhead(&self) -> usize {
        self.config
            .as_ref()
            .map(|config| config.suite.rtcp_auth_tag_len() + SRTCP_INDEX_LEN)
            .unwrap_or(0)
    }
}
