use crate::constants::*;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub auth_secret: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingAuthSecret,
    InvalidAuthSecret(String),
    InvalidPort(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingAuthSecret => {
                write!(f, "AUTH_SECRET environment variable is required")
            }
            ConfigError::InvalidAuthSecret(msg) => {
                write!(f, "Invalid auth secret: {}", msg)
            }
            ConfigError::InvalidPort(port) => {
                write!(f, "Invalid port number: {}", port)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("SERVER_PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
        let data_path = env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());

        // Validate port is a valid number
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPort(port));
        }

        // The shared secret the identity provider signs tokens with
        let auth_secret = env::var("AUTH_SECRET").map_err(|_| ConfigError::MissingAuthSecret)?;

        if auth_secret.len() < MIN_AUTH_SECRET_LENGTH {
            return Err(ConfigError::InvalidAuthSecret(format!(
                "must be at least {} characters long",
                MIN_AUTH_SECRET_LENGTH
            )));
        }

        Ok(Config {
            host,
            port,
            data_path,
            auth_secret,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
