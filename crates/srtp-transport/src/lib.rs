//! SRTP transport for the RVOIP project
//!
//! This crate provides the secure transport adapter that sits between the
//! media pipeline and an unsecured RTP transport: outbound RTP/RTCP is
//! protected (SRTP/SRTCP, RFC 3711 and RFC 7714) before it is sent, and
//! inbound packets are verified and decrypted before they reach listeners.
//!
//! The library is organized into several modules:
//!
//! - `transport`: the [`SrtpTransport`] adapter and the [`RtpTransport`] trait
//! - `srtp`: crypto sessions, cipher suites and key derivation
//! - `buffer`: fixed capacity packet buffers
//! - `packet`: the few RTP/RTCP header fields the transport reads
//! - `listener`: event delivery to registered listeners
//! - `config`: transport configuration
//! - `stats`: packet counters

pub mod error;

// Main modules
pub mod buffer;
pub mod config;
pub mod listener;
pub mod packet;
pub mod srtp;
pub mod stats;
pub mod transport;

// Re-export core types
pub use error::Error;
pub use buffer::PacketBuffer;
pub use config::{SrtpTransportConfig, SrtpTransportConfigBuilder};
pub use listener::{ChannelListener, ListenerId, TransportEvent, TransportListener};
pub use srtp::{CipherSuite, CryptoSession, RtpAuthParams, SessionFactory, SrtpCryptoKey, SrtpSession, SrtpSessionFactory};
pub use stats::SrtpTransportStats;
pub use transport::{
    ActivationState, ContentSource, PacketKind, PacketOptions, PacketTime,
    PacketTimeUpdateParams, RtpTransport, SrtpTransport,
};

/// Typedef for RTP sequence numbers
pub type RtpSequenceNumber = u16;

/// Typedef for RTP synchronization source identifier
pub type RtpSsrc = u32;

/// Result type for SRTP transport operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::{
        ActivationState, CipherSuite, ContentSource, Error, PacketBuffer, PacketKind,
        PacketOptions, PacketTime, Result, RtpTransport, SrtpCryptoKey, SrtpTransport,
        SrtpTransportConfig, TransportEvent,
    };
}
