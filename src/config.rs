//! Configuration manager for the time service.
//!
//! Everything comes from the environment; there is no configuration file.

use std::net::{Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 8080;
const PORT_VARIABLE: &str = "PORT";

/// Errors that may occur while reading the environment.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("`PORT` must be a port number, got {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// TCP port to listen on, on every interface.
    pub port: u16,
}

impl Default for Configuration {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl Configuration {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::parse(std::env::var(PORT_VARIABLE).ok().as_deref())
    }

    /// Builds the configuration from a raw `PORT` value.
    pub fn parse(port: Option<&str>) -> Result<Self, Error> {
        let port = match port.map(str::trim) {
            None | Some("") => DEFAULT_PORT,
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::InvalidPort(raw.to_owned()))?,
        };

        Ok(Self { port })
    }

    /// Socket address the server binds on.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
