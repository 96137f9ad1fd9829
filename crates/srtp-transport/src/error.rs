use thiserror::Error;

/// Error type for SRTP transport operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operation attempted while the required key material is absent
    #[error("SRTP transport is inactive")]
    Inactive,

    /// Protect or unprotect failed inside the crypto session
    #[error("SRTP crypto failure: {0}")]
    Crypto(String),

    /// Authentication tag did not verify
    #[error("SRTP authentication failed")]
    AuthenticationFailed,

    /// Packet index was already seen or is too old for the replay window
    #[error("SRTP replay detected for packet index {0}")]
    ReplayDetected(u64),

    /// Not enough capacity to hold the protection overhead
    #[error("Buffer too small for SRTP packet: need {required} but have {available}")]
    BufferTooSmall {
        required: usize,
        available: usize,
    },

    /// Attempt to overwrite parameters that may only be set once per activation
    #[error("Configuration conflict: {0}")]
    ConfigurationConflict(String),

    /// Cipher suite id not known to the crypto session
    #[error("Unsupported cipher suite: {0}")]
    UnsupportedCipherSuite(i32),

    /// Key material does not match the cipher suite
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Packet too short or malformed for the requested operation
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    /// Underlying transport refused the packet
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// True for errors raised by the crypto session while transforming a packet
    pub fn is_crypto_failure(&self) -> bool {
        matches!(
            self,
            Error::Crypto(_)
                | Error::AuthenticationFailed
                | Error::ReplayDetected(_)
                | Error::BufferTooSmall { .. }
                | Error::InvalidPacket(_)
        )
    }
}
