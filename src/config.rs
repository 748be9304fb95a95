//! Service configuration sourced from environment variables.

use crate::error::Error;
use crate::keys::DEFAULT_HS256_KEY_HEX;

const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration for the token service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// TCP port the HTTP listener binds to.
    pub port: u16,
    /// Hex-encoded initial symmetric signing key.
    pub hs256_key_hex: String,
    /// True when no `HS256_KEY` was supplied and the built-in default is in
    /// use. Callers should log this loudly.
    pub using_default_key: bool,
}

impl ServiceConfig {
    /// Read configuration from `PORT` and `HS256_KEY`.
    pub fn from_env() -> Result<Self, Error> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Encoding(format!("PORT is not a valid port: {raw}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let (hs256_key_hex, using_default_key) = match std::env::var("HS256_KEY") {
            Ok(key) if !key.is_empty() => (key, false),
            _ => (DEFAULT_HS256_KEY_HEX.to_string(), true),
        };

        Ok(Self {
            port,
            hs256_key_hex,
            using_default_key,
        })
    }
}
