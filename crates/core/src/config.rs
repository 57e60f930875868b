//! Session configuration shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default core service host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default core service port.
pub const DEFAULT_PORT: u16 = 2660;

/// Default send/receive timeout in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u32 = 10;

/// Connection settings for one invocation.
///
/// Every field is optional so that the client config file, environment and
/// command-line flags can be layered; the accessors apply the defaults.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Core service host name.
    #[serde(default)]
    pub host: Option<String>,
    /// Core service port. `0` is treated as unset.
    #[serde(default)]
    pub port: Option<u16>,
    /// Send and receive timeout in whole minutes.
    #[serde(default)]
    pub timeout_minutes: Option<u32>,
    /// Path prefix of the core service endpoint.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Path prefix of the streaming download endpoint.
    #[serde(default = "default_download_path")]
    pub download_path: String,
}

fn default_base_path() -> String {
    "/core-service/v1".to_string()
}

fn default_download_path() -> String {
    "/stream-download/v1".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl SessionConfig {
    /// Configuration with only the host, port and timeout set.
    pub fn new(host: Option<String>, port: Option<u16>, timeout_minutes: Option<u32>) -> Self {
        Self {
            host,
            port,
            timeout_minutes,
            base_path: default_base_path(),
            download_path: default_download_path(),
        }
    }

    /// Effective host.
    pub fn host(&self) -> &str {
        match self.host.as_deref() {
            Some(host) if !host.trim().is_empty() => host.trim(),
            _ => DEFAULT_HOST,
        }
    }

    /// Effective port.
    pub fn port(&self) -> u16 {
        match self.port {
            Some(0) | None => DEFAULT_PORT,
            Some(port) => port,
        }
    }

    /// Effective send/receive timeout.
    pub fn timeout(&self) -> Duration {
        let minutes = self.timeout_minutes.unwrap_or(DEFAULT_TIMEOUT_MINUTES);
        Duration::from_secs(u64::from(minutes) * 60)
    }

    /// Base URL of the core service endpoint, without a trailing slash.
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}/{}",
            self.host(),
            self.port(),
            self.base_path.trim_matches('/')
        )
    }

    /// Base URL of the streaming download endpoint, without a trailing slash.
    pub fn download_url(&self) -> String {
        format!(
            "http://{}:{}/{}",
            self.host(),
            self.port(),
            self.download_path.trim_matches('/')
        )
    }

    /// Replace host, port and timeout with the given values where they are set.
    pub fn override_with(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        timeout_minutes: Option<u32>,
    ) -> Self {
        if host.is_some() {
            self.host = host;
        }
        if port.is_some() {
            self.port = port;
        }
        if timeout_minutes.is_some() {
            self.timeout_minutes = timeout_minutes;
        }
        self
    }
}
