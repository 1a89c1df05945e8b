//! Configuration types for the Classroom app.
//!
//! Holds the endpoints, participant identities and unlock threshold that the
//! chat session and lesson gate are parameterized with.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chat::Participant;
use crate::error::{ClassroomError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "classroom.json";

/// Default chat relay endpoint.
fn default_relay_endpoint() -> String {
    "ws://localhost:8080/ws".to_string()
}

/// Default base URL of the course catalog API.
fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

/// Default number of leading sections whose lessons are playable.
const fn default_unlock_threshold() -> usize {
    2
}

/// Default local chat participant.
fn default_local_user() -> Participant {
    Participant::new("1", "User")
}

/// Default remote chat participant.
fn default_remote_user() -> Participant {
    Participant::new("2", "Server")
}

/// Default signed-in user for course listings.
fn default_user_id() -> String {
    "1".to_string()
}

/// Default per-subscriber buffer of the relay broadcaster.
const fn default_relay_capacity() -> usize {
    100
}

/// Default heartbeat interval for relay connections, in seconds.
const fn default_heartbeat_seconds() -> u64 {
    30
}

/// Main configuration for the Classroom app.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// WebSocket URL of the chat relay.
    #[serde(default = "default_relay_endpoint")]
    pub relay_endpoint: String,

    /// Base URL of the course catalog API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Sections with an index below this value are playable.
    #[serde(default = "default_unlock_threshold")]
    pub unlock_threshold: usize,

    /// Identity shown on locally sent chat messages.
    #[serde(default = "default_local_user")]
    pub local_user: Participant,

    /// Identity shown on messages received from the relay.
    #[serde(default = "default_remote_user")]
    pub remote_user: Participant,

    /// Signed-in user whose courses are listed.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Buffered events per relay subscriber before lagging.
    #[serde(default = "default_relay_capacity")]
    pub relay_capacity: usize,

    /// Seconds between relay heartbeat pings.
    #[serde(default = "default_heartbeat_seconds")]
    pub heartbeat_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_endpoint: default_relay_endpoint(),
            api_base_url: default_api_base_url(),
            unlock_threshold: default_unlock_threshold(),
            local_user: default_local_user(),
            remote_user: default_remote_user(),
            user_id: default_user_id(),
            relay_capacity: default_relay_capacity(),
            heartbeat_seconds: default_heartbeat_seconds(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `classroom.json`; returns defaults when it is absent.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            ClassroomError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `classroom.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration. A file that exists
    /// but cannot be parsed or validated is an error.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(ClassroomError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ClassroomError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `relayEndpoint` must be a `ws://` or `wss://` URL
    /// - `apiBaseUrl` must be an `http://` or `https://` URL
    /// - participant names and ids must not be empty
    /// - `relayCapacity` and `heartbeatSeconds` must be greater than 0
    pub fn validate(&self) -> Result<()> {
        if !(self.relay_endpoint.starts_with("ws://") || self.relay_endpoint.starts_with("wss://"))
        {
            return Err(ClassroomError::config_validation(
                format!("relayEndpoint '{}' is not a WebSocket URL", self.relay_endpoint),
                "Use a ws:// or wss:// URL, e.g. ws://localhost:8080/ws",
            ));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ClassroomError::config_validation(
                format!("apiBaseUrl '{}' is not an HTTP URL", self.api_base_url),
                "Use an http:// or https:// URL, e.g. http://localhost:8080/api",
            ));
        }

        for (field, participant) in [
            ("localUser", &self.local_user),
            ("remoteUser", &self.remote_user),
        ] {
            if participant.id.trim().is_empty() || participant.name.trim().is_empty() {
                return Err(ClassroomError::config_validation(
                    format!("{field} must have a non-empty id and name"),
                    format!("Set {field}.id and {field}.name in your classroom.json"),
                ));
            }
        }

        if self.user_id.trim().is_empty() {
            return Err(ClassroomError::config_validation(
                "userId must not be empty",
                "Set userId to the signed-in user's id in your classroom.json",
            ));
        }

        if self.relay_capacity == 0 {
            return Err(ClassroomError::config_validation(
                "relayCapacity must be greater than 0",
                "Set relayCapacity to at least 1 in your classroom.json",
            ));
        }

        if self.heartbeat_seconds == 0 {
            return Err(ClassroomError::config_validation(
                "heartbeatSeconds must be greater than 0",
                "Set heartbeatSeconds to at least 1 in your classroom.json",
            ));
        }

        if self.unlock_threshold == 0 {
            tracing::warn!("unlockThreshold is 0: every lesson will be locked");
        }

        Ok(())
    }
}
