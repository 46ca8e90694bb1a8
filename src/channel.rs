//! RCON-backed command channel

use anyhow::{Context, Result};
use craftform_rcon::Client;
use reconcile::{ChannelError, CommandChannel, ProviderConfig};

/// [`CommandChannel`] over one authenticated RCON connection
pub struct RconChannel {
    client: Client,
}

impl RconChannel {
    pub fn connect(config: &ProviderConfig) -> Result<Self> {
        let client = Client::connect(config.address(), config.password(), config.timeout())
            .with_context(|| format!("Failed to connect to RCON server at {}", config.address()))?;
        log::info!("Connected to {}", client.peer());
        Ok(Self { client })
    }
}

impl CommandChannel for RconChannel {
    fn send(&self, command: &str) -> Result<String, ChannelError> {
        self.client
            .send_command(command)
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }
}
