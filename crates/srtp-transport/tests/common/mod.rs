//! Shared helpers for the integration tests

#![allow(dead_code)]

use rvoip_srtp_transport::prelude::*;
use rvoip_srtp_transport::Error;

/// Underlying transport that records what it is asked to send
#[derive(Default)]
pub struct RecordingTransport {
    pub rtp: Vec<(Vec<u8>, PacketOptions)>,
    pub rtcp: Vec<(Vec<u8>, PacketOptions)>,
    pub rtcp_mux: bool,
    pub fail_sends: bool,
}

impl RtpTransport for RecordingTransport {
    fn send_rtp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, _flags: u32) -> Result<()> {
        if self.fail_sends {
            return Err(Error::Transport("socket closed".to_string()));
        }
        self.rtp.push((packet.as_slice().to_vec(), options.clone()));
        Ok(())
    }

    fn send_rtcp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, _flags: u32) -> Result<()> {
        if self.fail_sends {
            return Err(Error::Transport("socket closed".to_string()));
        }
        self.rtcp.push((packet.as_slice().to_vec(), options.clone()));
        Ok(())
    }

    fn is_rtcp_mux_enabled(&self) -> bool {
        self.rtcp_mux
    }

    fn set_rtcp_mux_enabled(&mut self, enabled: bool) {
        self.rtcp_mux = enabled;
    }
}

pub type TestTransport = SrtpTransport<RecordingTransport>;

// Set up a simple test logger
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Key material for both directions of a call
pub struct CallKeys {
    pub suite: CipherSuite,
    pub a_to_b: Vec<u8>,
    pub b_to_a: Vec<u8>,
}

impl CallKeys {
    pub fn generate(suite: CipherSuite) -> Self {
        Self {
            suite,
            a_to_b: SrtpCryptoKey::generate(suite).keying_material(),
            b_to_a: SrtpCryptoKey::generate(suite).keying_material(),
        }
    }

    pub fn apply_rtp(&self, a: &mut TestTransport, b: &mut TestTransport) {
        a.set_rtp_params(self.suite, &self.a_to_b, self.suite, &self.b_to_a).unwrap();
        b.set_rtp_params(self.suite, &self.b_to_a, self.suite, &self.a_to_b).unwrap();
    }

    pub fn apply_rtcp(&self, a: &mut TestTransport, b: &mut TestTransport) {
        a.set_rtcp_params(self.suite, &self.a_to_b, self.suite, &self.b_to_a).unwrap();
        b.set_rtcp_params(self.suite, &self.b_to_a, self.suite, &self.a_to_b).unwrap();
    }
}

/// Two unconfigured endpoints
pub fn endpoints() -> (TestTransport, TestTransport) {
    (
        SrtpTransport::new(RecordingTransport::default(), "audio-a"),
        SrtpTransport::new(RecordingTransport::default(), "audio-b"),
    )
}

/// Two endpoints with RTP keys installed
pub fn connected(suite: CipherSuite) -> (TestTransport, TestTransport) {
    let (mut a, mut b) = endpoints();
    CallKeys::generate(suite).apply_rtp(&mut a, &mut b);
    (a, b)
}

/// Build a minimal RTP packet
pub fn rtp_packet(seq: u16, ssrc: u32, payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x80, 0x00];
    packet.extend_from_slice(&seq.to_be_bytes());
    packet.extend_from_slice(&160u32.wrapping_mul(seq as u32).to_be_bytes());
    packet.extend_from_slice(&ssrc.to_be_bytes());
    packet.extend_from_slice(payload);
    packet
}

/// Build an RTP packet carrying one one-byte header extension
pub fn rtp_packet_with_extension(seq: u16, ssrc: u32, id: u8, value: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x90, 0x00];
    packet.extend_from_slice(&seq.to_be_bytes());
    packet.extend_from_slice(&0u32.to_be_bytes());
    packet.extend_from_slice(&ssrc.to_be_bytes());

    let mut body = vec![(id << 4) | (value.len() as u8 - 1)];
    body.extend_from_slice(value);
    while body.len() % 4 != 0 {
        body.push(0);
    }
    packet.extend_from_slice(&[0xBE, 0xDE]);
    packet.extend_from_slice(&((body.len() / 4) as u16).to_be_bytes());
    packet.extend_from_slice(&body);
    packet.extend_from_slice(payload);
    packet
}

/// Build an RTCP receiver report
pub fn rtcp_packet(ssrc: u32) -> Vec<u8> {
    let mut packet = vec![0x81, 201, 0x00, 0x07];
    packet.extend_from_slice(&ssrc.to_be_bytes());
    packet.extend_from_slice(&[0x42; 24]);
    packet
}

/// Take the last RTP packet `from` sent and hand it to `to`
pub fn deliver_rtp(from: &mut TestTransport, to: &mut TestTransport) -> Result<()> {
    let (bytes, _) = from.transport_mut().rtp.pop().expect("no RTP packet was sent");
    to.on_packet_received(PacketKind::Rtp, PacketBuffer::from_slice(&bytes), PacketTime::now())
}

/// Take the last RTCP packet `from` sent and hand it to `to`
pub fn deliver_rtcp(from: &mut TestTransport, to: &mut TestTransport) -> Result<()> {
    let (bytes, _) = from.transport_mut().rtcp.pop().expect("no RTCP packet was sent");
    to.on_packet_received(PacketKind::Rtcp, PacketBuffer::from_slice(&bytes), PacketTime::now())
}

/// Pull the next received packet out of a subscription, if any
pub fn next_packet(
    receiver: &mut tokio::sync::mpsc::UnboundedReceiver<TransportEvent>,
) -> Option<(PacketKind, Vec<u8>)> {
    loop {
        match receiver.try_recv() {
            Ok(TransportEvent::PacketReceived { kind, packet, .. }) => return Some((kind, packet.to_vec())),
            Ok(TransportEvent::ReadyToSend(_)) => continue,
            Err(_) => return None,
        }
    }
}
