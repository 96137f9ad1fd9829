//! Transport configuration

use serde::{Deserialize, Serialize};

use crate::srtp::DEFAULT_REPLAY_WINDOW_SIZE;

/// Settings applied when an [`crate::SrtpTransport`] is constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SrtpTransportConfig {
    /// Content (media section) name used in diagnostics
    pub content_name: String,

    /// Override the underlying transport's RTCP mux setting
    pub rtcp_mux_enabled: Option<bool>,

    /// Hand RTP tag computation to the network layer
    pub external_auth: bool,

    /// Id of the abs-send-time header extension, reported under external auth
    pub rtp_abs_sendtime_extension_id: Option<u8>,

    /// Packets remembered by each receive stream for replay detection, at most
    /// [`crate::srtp::MAX_REPLAY_WINDOW_SIZE`]
    pub replay_window_size: u64,
}

impl Default for SrtpTransportConfig {
    fn default() -> Self {
        Self {
            content_name: String::new(),
            rtcp_mux_enabled: None,
            external_auth: false,
            rtp_abs_sendtime_extension_id: None,
            replay_window_size: DEFAULT_REPLAY_WINDOW_SIZE,
        }
    }
}

/// Builder for [`SrtpTransportConfig`]
pub struct SrtpTransportConfigBuilder {
    config: SrtpTransportConfig,
}

impl SrtpTransportConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: SrtpTransportConfig::default(),
        }
    }

    /// Set the content name
    pub fn content_name(mut self, name: impl Into<String>) -> Self {
        self.config.content_name = name.into();
        self
    }

    /// Enable or disable RTCP mux on the underlying transport
    pub fn rtcp_mux(mut self, enable: bool) -> Self {
        self.config.rtcp_mux_enabled = Some(enable);
        self
    }

    /// Enable external authentication
    pub fn external_auth(mut self, enable: bool) -> Self {
        self.config.external_auth = enable;
        self
    }

    /// Set the abs-send-time header extension id
    pub fn rtp_abs_sendtime_extension_id(mut self, id: u8) -> Self {
        self.config.rtp_abs_sendtime_extension_id = Some(id);
        self
    }

    /// Set the replay window size
    pub fn replay_window_size(mut self, size: u64) -> Self {
        self.config.replay_window_size = size;
        self
    }

    /// Build the configuration
    pub fn build(self) -> SrtpTransportConfig {
        self.config
    }
}

impl Default for SrtpTransportConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = SrtpTransportConfigBuilder::new()
            .content_name("audio")
            .rtcp_mux(true)
            .external_auth(true)
            .rtp_abs_sendtime_extension_id(3)
            .replay_window_size(128)
            .build();

        assert_eq!(config.content_name, "audio");
        assert_eq!(config.rtcp_mux_enabled, Some(true));
        assert!(config.external_auth);
        assert_eq!(config.rtp_abs_sendtime_extension_id, Some(3));
        assert_eq!(config.replay_window_size, 128);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SrtpTransportConfig =
            serde_json::from_str(r#"{ "content_name": "video", "external_auth": true }"#).unwrap();

        assert_eq!(config.content_name, "video");
        assert!(config.external_auth);
        assert_eq!(config.rtcp_mux_enabled, None);
        assert_eq!(config.replay_window_size, DEFAULT_REPLAY_WINDOW_SIZE);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = SrtpTransportConfigBuilder::new().content_name("data").build();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SrtpTransportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
