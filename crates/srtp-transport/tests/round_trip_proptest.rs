mod common;

use common::*;
use proptest::prelude::*;
use rvoip_srtp_transport::prelude::*;

fn arb_suite() -> impl Strategy<Value = CipherSuite> {
    prop_oneof![
        Just(CipherSuite::AesCm128HmacSha1_80),
        Just(CipherSuite::AesCm128HmacSha1_32),
        Just(CipherSuite::AeadAes128Gcm),
        Just(CipherSuite::AeadAes256Gcm),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rtp_round_trips(
        suite in arb_suite(),
        seq in any::<u16>(),
        ssrc in any::<u32>(),
        payload in prop::collection::vec(any::<u8>(), 0..1200),
        extra_headroom in 0usize..8,
    ) {
        let (mut a, mut b) = connected(suite);
        let (_, mut events) = b.subscribe();

        let original = rtp_packet(seq, ssrc, &payload);
        let overhead = a.srtp_overhead().unwrap();
        let mut buf = PacketBuffer::with_headroom(&original, overhead + extra_headroom);
        a.send_rtp_packet(&mut buf, &PacketOptions::default(), 0).unwrap();
        prop_assert_eq!(buf.len(), original.len() + overhead);

        deliver_rtp(&mut a, &mut b).unwrap();
        prop_assert_eq!(next_packet(&mut events), Some((PacketKind::Rtp, original)));
    }

    #[test]
    fn rtcp_round_trips(
        suite in arb_suite(),
        ssrc in any::<u32>(),
        with_rtcp_keys in any::<bool>(),
    ) {
        let (mut a, mut b) = endpoints();
        let keys = CallKeys::generate(suite);
        keys.apply_rtp(&mut a, &mut b);
        if with_rtcp_keys {
            keys.apply_rtcp(&mut a, &mut b);
        }
        let (_, mut events) = b.subscribe();

        let original = rtcp_packet(ssrc);
        let mut buf = PacketBuffer::with_headroom(&original, 20);
        a.send_rtcp_packet(&mut buf, &PacketOptions::default(), 0).unwrap();

        deliver_rtcp(&mut a, &mut b).unwrap();
        prop_assert_eq!(next_packet(&mut events), Some((PacketKind::Rtcp, original)));
    }

    #[test]
    fn flipped_bit_never_delivered(
        suite in arb_suite(),
        payload in prop::collection::vec(any::<u8>(), 1..200),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let (mut a, mut b) = connected(suite);
        let (_, mut events) = b.subscribe();

        let mut buf = PacketBuffer::with_headroom(&rtp_packet(1, 1, &payload), 16);
        a.send_rtp_packet(&mut buf, &PacketOptions::default(), 0).unwrap();

        let (mut wire, _) = a.transport_mut().rtp.pop().unwrap();
        // Only bytes after the fixed header; a flipped version field is a parse error instead
        let i = 12 + position.index(wire.len() - 12);
        wire[i] ^= 1 << bit;

        let result = b.on_packet_received(PacketKind::Rtp, PacketBuffer::from_slice(&wire), PacketTime::now());
        prop_assert!(result.is_err());
        prop_assert_eq!(next_packet(&mut events), None);
    }
}
