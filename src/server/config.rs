//! Cast configuration

use crate::connection::ChannelId;
use crate::directory::ConnectInfo;

/// Default reserved cast channel
pub const DEFAULT_CAST_CHANNEL: ChannelId = ChannelId(0xFFFF);

/// Longest chat line accepted on the cast channel
pub const DEFAULT_MAX_CHAT_LEN: usize = 255;

/// Cast layer configuration options
#[derive(Debug, Clone)]
pub struct CastConfig {
    /// Whether live casting is available at all
    pub enabled: bool,

    /// Maximum concurrent casts (0 = none may start)
    pub max_casts: usize,

    /// Host advertised in directory listings
    pub connect_host: String,

    /// Viewer port advertised in directory listings
    pub connect_port: u16,

    /// Reserved chat channel carrying cast chat and commands
    pub channel_id: ChannelId,

    /// Name of the cast channel tab shown to the owner
    pub channel_name: String,

    /// Chat lines longer than this are ignored
    pub max_chat_len: usize,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_casts: 64,
            connect_host: "127.0.0.1".to_string(),
            connect_port: 7173,
            channel_id: DEFAULT_CAST_CHANNEL,
            channel_name: "Live Channel".to_string(),
            max_chat_len: DEFAULT_MAX_CHAT_LEN,
        }
    }
}

impl CastConfig {
    /// Turn live casting off
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set maximum concurrent casts
    pub fn max_casts(mut self, max: usize) -> Self {
        self.max_casts = max;
        self
    }

    /// Set the advertised viewer endpoint
    pub fn connect(mut self, host: impl Into<String>, port: u16) -> Self {
        self.connect_host = host.into();
        self.connect_port = port;
        self
    }

    /// Set the reserved cast channel
    pub fn channel(mut self, id: ChannelId, name: impl Into<String>) -> Self {
        self.channel_id = id;
        self.channel_name = name.into();
        self
    }

    /// Set maximum chat line length
    pub fn max_chat_len(mut self, len: usize) -> Self {
        self.max_chat_len = len;
        self
    }

    /// Viewer endpoint for directory listings
    pub fn connect_info(&self) -> ConnectInfo {
        ConnectInfo::new(self.connect_host.clone(), self.connect_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CastConfig::default();

        assert!(config.enabled);
        assert_eq!(config.max_casts, 64);
        assert_eq!(config.channel_id, DEFAULT_CAST_CHANNEL);
        assert_eq!(config.max_chat_len, 255);
        assert_eq!(config.connect_info(), ConnectInfo::new("127.0.0.1", 7173));
    }

    #[test]
    fn test_builder_disabled() {
        let config = CastConfig::default().disabled();

        assert!(!config.enabled);
    }

    #[test]
    fn test_builder_chaining() {
        let config = CastConfig::default()
            .max_casts(2)
            .connect("cast.example.org", 7174)
            .channel(ChannelId(0x50), "Cast")
            .max_chat_len(80);

        assert_eq!(config.max_casts, 2);
        assert_eq!(config.connect_info(), ConnectInfo::new("cast.example.org", 7174));
        assert_eq!(config.channel_id, ChannelId(0x50));
        assert_eq!(config.channel_name, "Cast");
        assert_eq!(config.max_chat_len, 80);
    }
}
