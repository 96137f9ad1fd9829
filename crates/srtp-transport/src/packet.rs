//! RTP/RTCP header helpers
//!
//! Only the fields the transport needs are read here: sequence number, SSRC
//! and packet type for diagnostics, the header length to locate the payload,
//! and header extension elements for encrypted extensions and send-time
//! rewriting. Full packet parsing lives elsewhere in the stack.

use std::ops::Range;

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::Error;
use crate::transport::PacketTimeUpdateParams;
use crate::{Result, RtpSequenceNumber, RtpSsrc};

type HmacSha1 = Hmac<Sha1>;

/// Size of the fixed RTP header
pub const RTP_FIXED_HEADER_LEN: usize = 12;

/// Size of the RTCP common header including the sender SSRC
pub const RTCP_HEADER_LEN: usize = 8;

/// Profile marker for one-byte header extensions (RFC 8285)
pub const ONE_BYTE_EXTENSION_PROFILE: u16 = 0xBEDE;

/// Profile marker for two-byte header extensions (RFC 8285), low 4 bits are app bits
pub const TWO_BYTE_EXTENSION_PROFILE: u16 = 0x1000;

/// Length of the abs-send-time extension payload
const ABS_SEND_TIME_LEN: usize = 3;

/// Read the RTP sequence number
pub fn rtp_sequence_number(data: &[u8]) -> Option<RtpSequenceNumber> {
    if data.len() < RTP_FIXED_HEADER_LEN {
        return None;
    }
    Some(u16::from_be_bytes([data[2], data[3]]))
}

/// Read the RTP synchronization source
pub fn rtp_ssrc(data: &[u8]) -> Option<RtpSsrc> {
    if data.len() < RTP_FIXED_HEADER_LEN {
        return None;
    }
    Some(u32::from_be_bytes([data[8], data[9], data[10], data[11]]))
}

/// Read the RTCP packet type of the first packet in a compound packet
pub fn rtcp_packet_type(data: &[u8]) -> Option<u8> {
    if data.len() < 4 {
        return None;
    }
    Some(data[1])
}

/// Read the sender SSRC of an RTCP packet
pub fn rtcp_ssrc(data: &[u8]) -> Option<RtpSsrc> {
    if data.len() < RTCP_HEADER_LEN {
        return None;
    }
    Some(u32::from_be_bytes([data[4], data[5], data[6], data[7]]))
}

/// True if the second byte carries an RTCP packet type (RFC 5761, section 4)
pub fn is_rtcp_packet(data: &[u8]) -> bool {
    data.len() >= 2 && (192..=223).contains(&data[1])
}

/// Total RTP header length: fixed header, CSRC list and header extension.
///
/// Returns `None` if the packet is not version 2 or is too short to hold the
/// header it announces.
pub fn rtp_header_len(data: &[u8]) -> Option<usize> {
    if data.len() < RTP_FIXED_HEADER_LEN || data[0] >> 6 != 2 {
        return None;
    }

    let csrc_count = (data[0] & 0x0F) as usize;
    let mut len = RTP_FIXED_HEADER_LEN + csrc_count * 4;

    if data[0] & 0x10 != 0 {
        if data.len() < len + 4 {
            return None;
        }
        let words = u16::from_be_bytes([data[len + 2], data[len + 3]]) as usize;
        len += 4 + words * 4;
    }

    if data.len() < len {
        return None;
    }
    Some(len)
}

/// One element of an RTP header extension block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderExtensionElement {
    /// Extension id
    pub id: u8,

    /// Byte range of the element payload within the packet
    pub data: Range<usize>,
}

/// List the header extension elements of an RTP packet.
///
/// Both the one-byte and two-byte forms are understood. Legacy (non RFC 8285)
/// extension blocks yield no elements.
pub fn rtp_header_extension_elements(data: &[u8]) -> Vec<HeaderExtensionElement> {
    let mut elements = Vec::new();

    let header_len = match rtp_header_len(data) {
        Some(len) => len,
        None => return elements,
    };
    if data[0] & 0x10 == 0 {
        return elements;
    }

    let ext_start = RTP_FIXED_HEADER_LEN + (data[0] & 0x0F) as usize * 4;
    let profile = u16::from_be_bytes([data[ext_start], data[ext_start + 1]]);
    let mut pos = ext_start + 4;
    let end = header_len;

    if profile == ONE_BYTE_EXTENSION_PROFILE {
        while pos < end {
            let id = data[pos] >> 4;
            if id == 0 {
                // Padding
                pos += 1;
                continue;
            }
            if id == 15 {
                break;
            }
            let len = (data[pos] & 0x0F) as usize + 1;
            let start = pos + 1;
            if start + len > end {
                break;
            }
            elements.push(HeaderExtensionElement { id, data: start..start + len });
            pos = start + len;
        }
    } else if profile & 0xFFF0 == TWO_BYTE_EXTENSION_PROFILE {
        while pos < end {
            let id = data[pos];
            if id == 0 {
                pos += 1;
                continue;
            }
            if pos + 1 >= end {
                break;
            }
            let len = data[pos + 1] as usize;
            let start = pos + 2;
            if start + len > end {
                break;
            }
            elements.push(HeaderExtensionElement { id, data: start..start + len });
            pos = start + len;
        }
    }

    elements
}

/// Find the payload range of header extension `id`
pub fn find_header_extension(data: &[u8], id: u8) -> Option<Range<usize>> {
    rtp_header_extension_elements(data)
        .into_iter()
        .find(|element| element.id == id)
        .map(|element| element.data)
}

/// Encode a wall clock time as the 24-bit 6.18 fixed point abs-send-time value
pub fn abs_send_time(send_time_ms: u64) -> u32 {
    (((send_time_ms << 18) / 1000) & 0x00FF_FFFF) as u32
}

/// Finish an RTP packet protected in external authentication mode.
///
/// This is the work the network layer does just before the packet leaves:
/// rewrite the abs-send-time extension (if an id is given and present) and
/// then compute the HMAC-SHA1 tag over the authenticated portion and the
/// rollover counter, writing it over the reserved trailer. `packet` must be
/// the whole protected packet, trailer included.
pub fn apply_packet_time_params(
    packet: &mut [u8],
    params: &PacketTimeUpdateParams,
    send_time_ms: u64,
) -> Result<()> {
    if let Some(id) = params.rtp_sendtime_extension_id {
        if let Some(range) = find_header_extension(packet, id) {
            if range.len() == ABS_SEND_TIME_LEN {
                let value = abs_send_time(send_time_ms).to_be_bytes();
                packet[range].copy_from_slice(&value[1..]);
            }
        }
    }

    if params.srtp_auth_key.is_empty() {
        return Ok(());
    }

    let tag_len = params.srtp_auth_tag_len;
    if tag_len == 0 || packet.len() < RTP_FIXED_HEADER_LEN + tag_len {
        return Err(Error::InvalidPacket(format!(
            "cannot place a {} byte auth tag in a {} byte packet",
            tag_len,
            packet.len()
        )));
    }

    let index = params.srtp_packet_index.ok_or_else(|| {
        Error::InvalidPacket("missing SRTP packet index for external auth".to_string())
    })?;
    let roc = (index >> 16) as u32;

    let auth_end = packet.len() - tag_len;
    let mut mac = HmacSha1::new_from_slice(&params.srtp_auth_key)
        .map_err(|e| Error::InvalidKey(format!("Failed to create HMAC: {}", e)))?;
    mac.update(&packet[..auth_end]);
    mac.update(&roc.to_be_bytes());
    let digest = mac.finalize().into_bytes();
    if tag_len > digest.len() {
        return Err(Error::InvalidPacket(format!("auth tag length {} exceeds HMAC output", tag_len)));
    }
    packet[auth_end..].copy_from_slice(&digest[..tag_len]);

    Ok(())
}
