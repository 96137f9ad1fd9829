//! SRTP transport statistics

use serde::Serialize;

use crate::transport::PacketKind;

/// Counters kept by [`crate::SrtpTransport`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SrtpTransportStats {
    /// RTP packets protected and accepted by the underlying transport
    pub rtp_packets_protected: u64,

    /// RTCP packets protected and accepted by the underlying transport
    pub rtcp_packets_protected: u64,

    /// Bytes accepted by the underlying transport, protection overhead included
    pub bytes_protected: u64,

    /// RTP packets unprotected and delivered to listeners
    pub rtp_packets_unprotected: u64,

    /// RTCP packets unprotected and delivered to listeners
    pub rtcp_packets_unprotected: u64,

    /// Plaintext bytes delivered to listeners
    pub bytes_unprotected: u64,

    /// Outbound packets the crypto session refused
    pub protect_failures: u64,

    /// Inbound packets that failed verification or decryption
    pub unprotect_failures: u64,

    /// Packets refused because no keys were installed
    pub inactive_drops: u64,
}

impl SrtpTransportStats {
    pub(crate) fn record_protected(&mut self, kind: PacketKind, bytes: usize) {
        match kind {
            PacketKind::Rtp => self.rtp_packets_protected += 1,
            PacketKind::Rtcp => self.rtcp_packets_protected += 1,
        }
        self.bytes_protected += bytes as u64;
    }

    pub(crate) fn record_unprotected(&mut self, kind: PacketKind, bytes: usize) {
        match kind {
            PacketKind::Rtp => self.rtp_packets_unprotected += 1,
            PacketKind::Rtcp => self.rtcp_packets_unprotected += 1,
        }
        self.bytes_unprotected += bytes as u64;
    }

    /// Total packets dropped on either path
    pub fn total_drops(&self) -> u64 {
        self.protect_failures + self.unprotect_failures + self.inactive_drops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = SrtpTransportStats::default();
        stats.record_protected(PacketKind::Rtp, 182);
        stats.record_protected(PacketKind::Rtcp, 50);
        stats.record_unprotected(PacketKind::Rtp, 172);
        stats.inactive_drops += 1;
        stats.unprotect_failures += 2;

        assert_eq!(stats.rtp_packets_protected, 1);
        assert_eq!(stats.rtcp_packets_protected, 1);
        assert_eq!(stats.bytes_protected, 232);
        assert_eq!(stats.rtp_packets_unprotected, 1);
        assert_eq!(stats.bytes_unprotected, 172);
        assert_eq!(stats.total_drops(), 3);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["bytes_protected"], 232);
    }
}
