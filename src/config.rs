use crate::constants::{
    DEFAULT_LISTEN_ADDRESS, DEFAULT_LISTEN_PORT, DEFAULT_RECEIVE_BUFFER_SIZE,
    DEFAULT_TRANSFER_BUFFER_SIZE,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub listen_port: u16,
    pub root_dir: String,
    pub require_account_and_password: bool,
    pub transfer_buffer_size: Option<usize>, // Optional to allow default value
    pub receive_buffer_size: Option<usize>,  // Optional to allow default value
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from(DEFAULT_LISTEN_ADDRESS),
            listen_port: DEFAULT_LISTEN_PORT,
            root_dir: String::from("."),
            require_account_and_password: true,
            transfer_buffer_size: Some(DEFAULT_TRANSFER_BUFFER_SIZE),
            receive_buffer_size: Some(DEFAULT_RECEIVE_BUFFER_SIZE),
            hostname: None,
        }
    }
}

impl ServerConfig {
    pub fn transfer_buffer_size(&self) -> usize {
        self.transfer_buffer_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_TRANSFER_BUFFER_SIZE)
    }

    pub fn receive_buffer_size(&self) -> usize {
        self.receive_buffer_size
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_RECEIVE_BUFFER_SIZE)
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))
    }

    pub fn from_toml(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }
}
