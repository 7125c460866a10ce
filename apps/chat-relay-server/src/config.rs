//! Server configuration from CLI flags and environment.

use std::net::{IpAddr, SocketAddr};

use chat_relay_session::{DEFAULT_SYSTEM_PROMPT, manager::DEFAULT_MODEL};
use chat_relay_upstream::DEFAULT_BASE_URL;
use clap::Parser;

/// CLI arguments for the chat relay.
///
/// Every flag falls back to an environment variable, so a `.env` file
/// loaded before parsing is enough to configure the server.
#[derive(Parser, Clone)]
#[command(name = "chat-relay")]
#[command(version, about = "Relay chat turns to an LLM API as server-sent events")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "CHAT_RELAY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "CHAT_RELAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Upstream API key (not validated locally)
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible API root
    #[arg(long, env = "CHAT_RELAY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model used when a request does not name one
    #[arg(long, value_name = "MODEL", env = "CHAT_RELAY_DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub default_model: String,

    /// First message of every new session
    #[arg(long, env = "CHAT_RELAY_SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,
}

impl Config {
    /// Socket address the server binds.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "chat-relay",
            "--host",
            "0.0.0.0",
            "--port",
            "9001",
            "--api-key",
            "gsk_test",
            "--base-url",
            "http://localhost:11434/v1",
            "--default-model",
            "llama3",
            "--system-prompt",
            "Answer in French.",
        ])
        .unwrap();

        assert_eq!(config.listen_addr(), SocketAddr::from(([0, 0, 0, 0], 9001)));
        assert_eq!(config.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.default_model, "llama3");
        assert_eq!(config.system_prompt, "Answer in French.");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(Config::try_parse_from(["chat-relay", "--port", "not-a-port"]).is_err());
    }
}
