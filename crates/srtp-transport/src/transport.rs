//! Secure RTP transport
//!
//! [`SrtpTransport`] wraps an unsecured [`RtpTransport`]. Outbound packets are
//! protected before they are handed down; inbound packets reported through
//! [`SrtpTransport::on_packet_received`] are unprotected and re-emitted to
//! the registered listeners. Nothing flows in either direction until RTP
//! keys are installed with [`SrtpTransport::set_rtp_params`].

use std::fmt;
use std::mem;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::buffer::PacketBuffer;
use crate::config::SrtpTransportConfig;
use crate::error::Error;
use crate::listener::{ChannelListener, EventListeners, ListenerId, TransportEvent, TransportListener};
use crate::packet;
use crate::srtp::{
    CipherSuite, CryptoSession, RtpAuthParams, SessionFactory, SrtpSessionFactory, MAX_REPLAY_WINDOW_SIZE,
};
use crate::stats::SrtpTransportStats;
use crate::Result;

/// Only every Nth inbound RTP failure is logged at error level
const RTP_UNPROTECT_LOG_INTERVAL: u64 = 100;

/// RTP or RTCP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Rtp,
    Rtcp,
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketKind::Rtp => f.write_str("RTP"),
            PacketKind::Rtcp => f.write_str("RTCP"),
        }
    }
}

/// Which side of the negotiation a setting came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Our own description; governs what we receive
    Local,

    /// The peer's description; governs what we send
    Remote,
}

/// Observable activation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    /// No sessions
    Unconfigured,

    /// RTP sessions installed, RTCP uses them too
    RtpActive,

    /// Dedicated RTCP sessions installed as well
    RtpAndRtcpActive,
}

/// Arrival time of an inbound packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketTime {
    /// When the packet was read from the network, if known
    pub arrival: Option<Instant>,
}

impl PacketTime {
    /// Stamp with the current time
    pub fn now() -> Self {
        Self { arrival: Some(Instant::now()) }
    }
}

/// Values a network layer needs to finish an externally authenticated packet.
///
/// Filled in by [`SrtpTransport`] when external auth is active; consumed by
/// [`packet::apply_packet_time_params`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PacketTimeUpdateParams {
    /// Header extension id of abs-send-time
    pub rtp_sendtime_extension_id: Option<u8>,

    /// Session authentication key
    pub srtp_auth_key: Vec<u8>,

    /// Bytes of tag to write at the end of the packet
    pub srtp_auth_tag_len: usize,

    /// SRTP packet index (ROC << 16 | SEQ)
    pub srtp_packet_index: Option<u64>,
}

impl fmt::Debug for PacketTimeUpdateParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketTimeUpdateParams")
            .field("rtp_sendtime_extension_id", &self.rtp_sendtime_extension_id)
            .field("srtp_auth_key_len", &self.srtp_auth_key.len())
            .field("srtp_auth_tag_len", &self.srtp_auth_tag_len)
            .field("srtp_packet_index", &self.srtp_packet_index)
            .finish()
    }
}

/// Per-packet side channel passed down with every send
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketOptions {
    /// Caller-assigned id, echoed by transports that report sent packets
    pub packet_id: Option<i64>,

    /// External auth parameters
    pub packet_time_params: PacketTimeUpdateParams,
}

/// Unsecured packet transport underneath [`SrtpTransport`]
pub trait RtpTransport: Send {
    /// Send an RTP packet
    fn send_rtp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()>;

    /// Send an RTCP packet
    fn send_rtcp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()>;

    /// True if RTP and RTCP share one channel
    fn is_rtcp_mux_enabled(&self) -> bool;

    /// Enable or disable RTCP mux
    fn set_rtcp_mux_enabled(&mut self, enabled: bool);
}

impl<T: RtpTransport + ?Sized> RtpTransport for Box<T> {
    fn send_rtp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        (**self).send_rtp_packet(packet, options, flags)
    }

    fn send_rtcp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        (**self).send_rtcp_packet(packet, options, flags)
    }

    fn is_rtcp_mux_enabled(&self) -> bool {
        (**self).is_rtcp_mux_enabled()
    }

    fn set_rtcp_mux_enabled(&mut self, enabled: bool) {
        (**self).set_rtcp_mux_enabled(enabled)
    }
}

/// A transport shared with other owners
impl<T: RtpTransport> RtpTransport for Arc<Mutex<T>> {
    fn send_rtp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        self.lock().send_rtp_packet(packet, options, flags)
    }

    fn send_rtcp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        self.lock().send_rtcp_packet(packet, options, flags)
    }

    fn is_rtcp_mux_enabled(&self) -> bool {
        self.lock().is_rtcp_mux_enabled()
    }

    fn set_rtcp_mux_enabled(&mut self, enabled: bool) {
        self.lock().set_rtcp_mux_enabled(enabled)
    }
}

/// Send and receive sessions for one packet kind
struct DirectionalSessions {
    send: Box<dyn CryptoSession>,
    recv: Box<dyn CryptoSession>,
}

/// Sessions valid in each activation state
enum SessionState {
    Unconfigured,
    RtpActive {
        rtp: DirectionalSessions,
    },
    RtpAndRtcpActive {
        rtp: DirectionalSessions,
        rtcp: DirectionalSessions,
    },
}

impl SessionState {
    fn activation(&self) -> ActivationState {
        match self {
            SessionState::Unconfigured => ActivationState::Unconfigured,
            SessionState::RtpActive { .. } => ActivationState::RtpActive,
            SessionState::RtpAndRtcpActive { .. } => ActivationState::RtpAndRtcpActive,
        }
    }

    fn rtp(&self) -> Option<&DirectionalSessions> {
        match self {
            SessionState::Unconfigured => None,
            SessionState::RtpActive { rtp } | SessionState::RtpAndRtcpActive { rtp, .. } => Some(rtp),
        }
    }

    fn rtp_mut(&mut self) -> Option<&mut DirectionalSessions> {
        match self {
            SessionState::Unconfigured => None,
            SessionState::RtpActive { rtp } | SessionState::RtpAndRtcpActive { rtp, .. } => Some(rtp),
        }
    }

    /// Sessions for `kind`; RTCP uses the RTP sessions when it has none of its own
    fn sessions_mut(&mut self, kind: PacketKind) -> Result<&mut DirectionalSessions> {
        match (self, kind) {
            (SessionState::Unconfigured, _) => Err(Error::Inactive),
            (SessionState::RtpAndRtcpActive { rtcp, .. }, PacketKind::Rtcp) => Ok(rtcp),
            (SessionState::RtpActive { rtp }, _) | (SessionState::RtpAndRtcpActive { rtp, .. }, _) => Ok(rtp),
        }
    }
}

/// SRTP/SRTCP adapter over an unsecured transport.
///
/// All methods take `&mut self`; the adapter is driven from a single context
/// and does no locking of its own.
pub struct SrtpTransport<T> {
    content_name: String,
    transport: T,
    factory: Box<dyn SessionFactory>,
    state: SessionState,
    send_encrypted_header_extension_ids: Vec<u8>,
    recv_encrypted_header_extension_ids: Vec<u8>,
    external_auth_enabled: bool,
    rtp_abs_sendtime_extension_id: Option<u8>,
    listeners: EventListeners,
    stats: SrtpTransportStats,
}

impl<T: RtpTransport> SrtpTransport<T> {
    /// Create an inactive transport with the default crypto sessions
    pub fn new(transport: T, content_name: impl Into<String>) -> Self {
        Self::with_session_factory(transport, content_name, SrtpSessionFactory::default())
    }

    /// Create an inactive transport that gets its sessions from `factory`
    pub fn with_session_factory(
        transport: T,
        content_name: impl Into<String>,
        factory: impl SessionFactory + 'static,
    ) -> Self {
        Self {
            content_name: content_name.into(),
            transport,
            factory: Box::new(factory),
            state: SessionState::Unconfigured,
            send_encrypted_header_extension_ids: Vec::new(),
            recv_encrypted_header_extension_ids: Vec::new(),
            external_auth_enabled: false,
            rtp_abs_sendtime_extension_id: None,
            listeners: EventListeners::new(),
            stats: SrtpTransportStats::default(),
        }
    }

    /// Create an inactive transport from a configuration
    pub fn with_config(mut transport: T, config: SrtpTransportConfig) -> Self {
        if let Some(enabled) = config.rtcp_mux_enabled {
            transport.set_rtcp_mux_enabled(enabled);
        }
        if config.replay_window_size > MAX_REPLAY_WINDOW_SIZE {
            warn!(
                "Replay window of {} packets for {} exceeds {}, clamping",
                config.replay_window_size, config.content_name, MAX_REPLAY_WINDOW_SIZE
            );
        }
        let mut srtp = Self::with_session_factory(
            transport,
            config.content_name,
            SrtpSessionFactory::new(config.replay_window_size),
        );
        srtp.rtp_abs_sendtime_extension_id = config.rtp_abs_sendtime_extension_id;
        if config.external_auth {
            srtp.enable_external_auth();
        }
        srtp
    }

    /// Content name used in diagnostics
    pub fn content_name(&self) -> &str {
        &self.content_name
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport, mutably
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the adapter and return the underlying transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    // ---- Activation ----

    /// Install RTP keys for both directions.
    ///
    /// Fresh sessions are created every time. On success any dedicated RTCP
    /// sessions are kept; on failure every session, RTCP included, is torn
    /// down and the transport is inactive.
    pub fn set_rtp_params(
        &mut self,
        send_suite: CipherSuite,
        send_key: &[u8],
        recv_suite: CipherSuite,
        recv_key: &[u8],
    ) -> Result<()> {
        match self.create_sessions(PacketKind::Rtp, send_suite, send_key, recv_suite, recv_key) {
            Ok(rtp) => {
                self.state = match mem::replace(&mut self.state, SessionState::Unconfigured) {
                    SessionState::RtpAndRtcpActive { rtcp, .. } => SessionState::RtpAndRtcpActive { rtp, rtcp },
                    _ => SessionState::RtpActive { rtp },
                };
                info!(
                    "SRTP activated for {}: send {} recv {}",
                    self.content_name, send_suite, recv_suite
                );
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Unconfigured;
                error!("Failed to set SRTP params for {}: {}", self.content_name, e);
                Err(e)
            }
        }
    }

    /// Install dedicated RTCP keys.
    ///
    /// Allowed once per activation, after RTP keys. A failure leaves the RTP
    /// sessions in place.
    pub fn set_rtcp_params(
        &mut self,
        send_suite: CipherSuite,
        send_key: &[u8],
        recv_suite: CipherSuite,
        recv_key: &[u8],
    ) -> Result<()> {
        match self.state {
            SessionState::Unconfigured => {
                warn!("Tried to set SRTCP params for {} before SRTP params", self.content_name);
                return Err(Error::Inactive);
            }
            SessionState::RtpAndRtcpActive { .. } => {
                warn!("Tried to set SRTCP params for {} when SRTCP is already active", self.content_name);
                return Err(Error::ConfigurationConflict(
                    "SRTCP params already set".to_string(),
                ));
            }
            SessionState::RtpActive { .. } => {}
        }

        let rtcp = self
            .create_sessions(PacketKind::Rtcp, send_suite, send_key, recv_suite, recv_key)
            .map_err(|e| {
                error!("Failed to set SRTCP params for {}: {}", self.content_name, e);
                e
            })?;

        if let SessionState::RtpActive { rtp } = mem::replace(&mut self.state, SessionState::Unconfigured) {
            self.state = SessionState::RtpAndRtcpActive { rtp, rtcp };
        }
        info!("SRTCP activated for {}: send {} recv {}", self.content_name, send_suite, recv_suite);
        Ok(())
    }

    fn create_sessions(
        &self,
        kind: PacketKind,
        send_suite: CipherSuite,
        send_key: &[u8],
        recv_suite: CipherSuite,
        recv_key: &[u8],
    ) -> Result<DirectionalSessions> {
        let mut send = self.factory.create_session();
        let mut recv = self.factory.create_session();

        if kind == PacketKind::Rtp {
            send.set_encrypted_header_extension_ids(&self.send_encrypted_header_extension_ids);
            recv.set_encrypted_header_extension_ids(&self.recv_encrypted_header_extension_ids);
            if self.external_auth_enabled {
                send.enable_external_auth();
            }
        }

        send.set_send(send_suite, send_key)?;
        recv.set_recv(recv_suite, recv_key)?;
        Ok(DirectionalSessions { send, recv })
    }

    /// Drop every session and return to the unconfigured state
    pub fn reset_params(&mut self) {
        self.state = SessionState::Unconfigured;
        info!("The params in SRTP reset for {}", self.content_name);
    }

    /// True once RTP keys are installed
    pub fn is_active(&self) -> bool {
        self.state.rtp().is_some()
    }

    /// Current activation state
    pub fn state(&self) -> ActivationState {
        self.state.activation()
    }

    /// Set the header extension ids whose values are encrypted.
    ///
    /// Ids from the local description apply to received packets, ids from
    /// the remote description to sent packets. Live RTP sessions are updated.
    pub fn set_encrypted_header_extension_ids(&mut self, source: ContentSource, ids: &[u8]) {
        match source {
            ContentSource::Local => self.recv_encrypted_header_extension_ids = ids.to_vec(),
            ContentSource::Remote => self.send_encrypted_header_extension_ids = ids.to_vec(),
        }
        if let Some(rtp) = self.state.rtp_mut() {
            match source {
                ContentSource::Local => rtp.recv.set_encrypted_header_extension_ids(ids),
                ContentSource::Remote => rtp.send.set_encrypted_header_extension_ids(ids),
            }
        }
        debug!("Encrypted header extension ids for {} ({:?}): {:?}", self.content_name, source, ids);
    }

    /// Hand RTP tag computation to the network layer.
    ///
    /// # Panics
    ///
    /// Panics if called while the transport is active.
    pub fn enable_external_auth(&mut self) {
        assert!(
            !self.is_active(),
            "external auth must be enabled before SRTP params are set"
        );
        self.external_auth_enabled = true;
    }

    /// True if external auth was requested
    pub fn is_external_auth_enabled(&self) -> bool {
        self.external_auth_enabled
    }

    /// True if external auth is requested and the negotiated send suite allows it
    pub fn is_external_auth_active(&self) -> bool {
        self.state
            .rtp()
            .map(|rtp| rtp.send.is_external_auth_active())
            .unwrap_or(false)
    }

    /// Authentication key and tag length of the outbound RTP session
    pub fn rtp_auth_params(&self) -> Result<RtpAuthParams> {
        match self.state.rtp() {
            Some(rtp) => rtp.send.rtp_auth_params(),
            None => {
                warn!("Failed to get RTP auth params for {}: SRTP not active", self.content_name);
                Err(Error::Inactive)
            }
        }
    }

    /// Bytes each outbound RTP packet grows by
    pub fn srtp_overhead(&self) -> Result<usize> {
        match self.state.rtp() {
            Some(rtp) => Ok(rtp.send.srtp_overhead()),
            None => {
                warn!("Failed to get SRTP overhead for {}: SRTP not active", self.content_name);
                Err(Error::Inactive)
            }
        }
    }

    /// Header extension id of abs-send-time, reported under external auth
    pub fn set_rtp_abs_sendtime_extension_id(&mut self, id: Option<u8>) {
        self.rtp_abs_sendtime_extension_id = id;
    }

    // ---- Packet path ----

    /// Protect an RTP packet and send it.
    ///
    /// `packet` must have room for [`SrtpTransport::srtp_overhead`] bytes past
    /// its length. On failure the packet is not sent.
    pub fn send_rtp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        self.send_packet(PacketKind::Rtp, packet, options, flags)
    }

    /// Protect an RTCP packet and send it
    pub fn send_rtcp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        self.send_packet(PacketKind::Rtcp, packet, options, flags)
    }

    fn send_packet(
        &mut self,
        kind: PacketKind,
        packet: &mut PacketBuffer,
        options: &PacketOptions,
        flags: u32,
    ) -> Result<()> {
        if !self.is_active() {
            warn!(
                "Failed to send {} packet for {}: SRTP not active",
                kind, self.content_name
            );
            self.stats.inactive_drops += 1;
            return Err(Error::Inactive);
        }

        let mut updated_options = options.clone();
        if let Err(e) = self.protect(kind, packet, &mut updated_options) {
            self.stats.protect_failures += 1;
            log_protect_failure(&self.content_name, kind, packet.as_slice(), &e);
            return Err(e);
        }

        match kind {
            PacketKind::Rtp => self.transport.send_rtp_packet(packet, &updated_options, flags)?,
            PacketKind::Rtcp => self.transport.send_rtcp_packet(packet, &updated_options, flags)?,
        }
        self.stats.record_protected(kind, packet.len());
        Ok(())
    }

    fn protect(&mut self, kind: PacketKind, packet: &mut PacketBuffer, options: &mut PacketOptions) -> Result<()> {
        let sendtime_extension_id = self.rtp_abs_sendtime_extension_id;
        let session = &mut self.state.sessions_mut(kind)?.send;

        let len = packet.len();
        let overhead = match kind {
            PacketKind::Rtp => session.srtp_overhead(),
            PacketKind::Rtcp => session.srtcp_overhead(),
        };
        if packet.headroom() < overhead {
            return Err(Error::BufferTooSmall {
                required: len + overhead,
                available: packet.capacity(),
            });
        }

        let new_len = match kind {
            PacketKind::Rtp if session.is_external_auth_active() => {
                // Fetch first so a failure leaves the packet untouched
                let auth = session.rtp_auth_params()?;
                let (new_len, index) = session.protect_rtp_with_index(packet.as_mut_capacity_slice(), len)?;
                options.packet_time_params = PacketTimeUpdateParams {
                    rtp_sendtime_extension_id: sendtime_extension_id,
                    srtp_auth_key: auth.key,
                    srtp_auth_tag_len: auth.tag_len,
                    srtp_packet_index: Some(index),
                };
                new_len
            }
            PacketKind::Rtp => session.protect_rtp(packet.as_mut_capacity_slice(), len)?,
            PacketKind::Rtcp => session.protect_rtcp(packet.as_mut_capacity_slice(), len)?,
        };
        packet.set_len(new_len)
    }

    /// Unprotect a packet read from the network and deliver it to listeners.
    ///
    /// Packets that arrive while inactive or fail verification are dropped
    /// and nothing is emitted; the error is returned for the caller's
    /// information only.
    pub fn on_packet_received(&mut self, kind: PacketKind, mut packet: PacketBuffer, packet_time: PacketTime) -> Result<()> {
        if !self.is_active() {
            warn!(
                "Inactive SRTP transport {} received a {} packet, dropping",
                self.content_name, kind
            );
            self.stats.inactive_drops += 1;
            return Err(Error::Inactive);
        }

        if let Err(e) = self.unprotect(kind, &mut packet) {
            self.stats.unprotect_failures += 1;
            log_unprotect_failure(
                &self.content_name,
                kind,
                packet.as_slice(),
                &e,
                self.stats.unprotect_failures,
            );
            return Err(e);
        }
        self.stats.record_unprotected(kind, packet.len());

        self.listeners.emit(&TransportEvent::PacketReceived {
            kind,
            packet: packet.freeze(),
            packet_time,
        });
        Ok(())
    }

    fn unprotect(&mut self, kind: PacketKind, packet: &mut PacketBuffer) -> Result<()> {
        let session = &mut self.state.sessions_mut(kind)?.recv;
        let new_len = match kind {
            PacketKind::Rtp => session.unprotect_rtp(packet.as_mut_slice())?,
            PacketKind::Rtcp => session.unprotect_rtcp(packet.as_mut_slice())?,
        };
        packet.set_len(new_len)
    }

    /// Forward a writability change from the underlying transport
    pub fn on_ready_to_send(&mut self, ready: bool) {
        debug!("SRTP transport {} ready to send: {}", self.content_name, ready);
        self.listeners.emit(&TransportEvent::ReadyToSend(ready));
    }

    /// True if the underlying transport muxes RTP and RTCP
    pub fn is_rtcp_mux_enabled(&self) -> bool {
        self.transport.is_rtcp_mux_enabled()
    }

    /// Enable or disable RTCP mux on the underlying transport
    pub fn set_rtcp_mux_enabled(&mut self, enabled: bool) {
        self.transport.set_rtcp_mux_enabled(enabled);
    }

    // ---- Listeners ----

    /// Register a listener for received packets and readiness changes
    pub fn add_listener(&mut self, listener: impl TransportListener + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    /// Unregister a listener. Returns false if `id` was unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Register a channel listener and return its receiver
    pub fn subscribe(&mut self) -> (ListenerId, mpsc::UnboundedReceiver<TransportEvent>) {
        let (listener, receiver) = ChannelListener::new();
        (self.add_listener(listener), receiver)
    }

    /// Packet counters
    pub fn stats(&self) -> &SrtpTransportStats {
        &self.stats
    }
}

impl<T: RtpTransport> RtpTransport for SrtpTransport<T> {
    fn send_rtp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        SrtpTransport::send_rtp_packet(self, packet, options, flags)
    }

    fn send_rtcp_packet(&mut self, packet: &mut PacketBuffer, options: &PacketOptions, flags: u32) -> Result<()> {
        SrtpTransport::send_rtcp_packet(self, packet, options, flags)
    }

    fn is_rtcp_mux_enabled(&self) -> bool {
        SrtpTransport::is_rtcp_mux_enabled(self)
    }

    fn set_rtcp_mux_enabled(&mut self, enabled: bool) {
        SrtpTransport::set_rtcp_mux_enabled(self, enabled)
    }
}

impl<T> fmt::Debug for SrtpTransport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrtpTransport")
            .field("content_name", &self.content_name)
            .field("state", &self.state.activation())
            .field("external_auth_enabled", &self.external_auth_enabled)
            .field("listeners", &self.listeners)
            .finish()
    }
}

fn log_protect_failure(content_name: &str, kind: PacketKind, data: &[u8], err: &Error) {
    match kind {
        PacketKind::Rtp => error!(
            "Failed to protect {} RTP packet: size={}, seqnum={:?}, SSRC={:?}: {}",
            content_name,
            data.len(),
            packet::rtp_sequence_number(data),
            packet::rtp_ssrc(data),
            err
        ),
        PacketKind::Rtcp => error!(
            "Failed to protect {} RTCP packet: size={}, type={:?}: {}",
            content_name,
            data.len(),
            packet::rtcp_packet_type(data),
            err
        ),
    }
}

fn log_unprotect_failure(content_name: &str, kind: PacketKind, data: &[u8], err: &Error, failures: u64) {
    match kind {
        PacketKind::Rtp => {
            // Bursts of bad packets are common around rekeying
            if failures % RTP_UNPROTECT_LOG_INTERVAL == 1 {
                error!(
                    "Failed to unprotect {} RTP packet: size={}, seqnum={:?}, SSRC={:?}, failures={}: {}",
                    content_name,
                    data.len(),
                    packet::rtp_sequence_number(data),
                    packet::rtp_ssrc(data),
                    failures,
                    err
                );
            } else {
                debug!("Failed to unprotect {} RTP packet: {}", content_name, err);
            }
        }
        PacketKind::Rtcp => error!(
            "Failed to unprotect {} RTCP packet: size={}, type={:?}: {}",
            content_name,
            data.len(),
            packet::rtcp_packet_type(data),
            err
        ),
    }
}
