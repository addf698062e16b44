//! Server registry: maps logical server identifiers to endpoint profiles
//!
//! The `auto` identifier is a fixed fallback to the configured default
//! server. It does not pick the nearest server.

use crate::defaults::{AUTO_SERVER_ID, DEFAULT_SERVER_ID};
use crate::error::{AppError, Result};
use crate::models::ServerProfile;

/// Lookup table of the servers a run can target
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    profiles: Vec<ServerProfile>,
    default_id: String,
}

impl Default for ServerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ServerRegistry {
    /// Registry of the built-in public test servers
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
            default_id: DEFAULT_SERVER_ID.to_string(),
        }
    }

    /// Registry over an explicit set of profiles; the first one is the default
    pub fn from_profiles(profiles: Vec<ServerProfile>) -> Result<Self> {
        let default_id = profiles
            .first()
            .map(|p| p.id.clone())
            .ok_or_else(|| AppError::config("Server registry needs at least one server"))?;

        for profile in &profiles {
            if profile.id == AUTO_SERVER_ID {
                return Err(AppError::config(format!(
                    "'{}' is reserved and cannot be used as a server identifier",
                    AUTO_SERVER_ID
                )));
            }
            profile.validate()?;
        }

        Ok(Self { profiles, default_id })
    }

    /// Change which server `auto` resolves to
    pub fn with_default(mut self, server_id: &str) -> Result<Self> {
        let key = normalize(server_id);
        if self.find(&key).is_none() {
            return Err(AppError::unknown_server(server_id));
        }
        self.default_id = key;
        Ok(self)
    }

    /// Resolve a server identifier to its profile
    ///
    /// Unknown identifiers are rejected rather than silently replaced by the
    /// default server.
    pub fn resolve(&self, server_id: &str) -> Result<ServerProfile> {
        let key = normalize(server_id);
        let key = if key == AUTO_SERVER_ID { self.default_id.as_str() } else { key.as_str() };

        self.find(key)
            .cloned()
            .ok_or_else(|| AppError::unknown_server(server_id.trim()))
    }

    /// All concrete profiles in declaration order
    pub fn list(&self) -> &[ServerProfile] {
        &self.profiles
    }

    /// Every accepted identifier, `auto` first
    pub fn identifiers(&self) -> Vec<String> {
        std::iter::once(AUTO_SERVER_ID.to_string())
            .chain(self.profiles.iter().map(|p| p.id.clone()))
            .collect()
    }

    /// Identifier that `auto` currently maps to
    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Whether `server_id` is accepted by [`resolve`](Self::resolve)
    pub fn is_known(&self, server_id: &str) -> bool {
        let key = normalize(server_id);
        key == AUTO_SERVER_ID || self.find(&key).is_some()
    }

    /// Whether `server_id` names a real server rather than `auto`
    pub fn is_concrete(&self, server_id: &str) -> bool {
        self.find(&normalize(server_id)).is_some()
    }

    fn find(&self, key: &str) -> Option<&ServerProfile> {
        self.profiles.iter().find(|p| p.id == key)
    }
}

fn normalize(server_id: &str) -> String {
    server_id.trim().to_lowercase()
}

fn builtin_profiles() -> Vec<ServerProfile> {
    vec![
        ServerProfile::new(
            "hetzner",
            "Hetzner",
            "Nuremberg, DE",
            "https://speed.hetzner.de/100MB.bin",
            "https://httpbin.org/post",
            "https://speed.hetzner.de/",
        ),
        ServerProfile::new(
            "cloudflare",
            "Cloudflare",
            "Anycast",
            "https://speed.cloudflare.com/__down?bytes=104857600",
            "https://speed.cloudflare.com/__up",
            "https://speed.cloudflare.com/__down?bytes=0",
        ),
        ServerProfile::new(
            "tele2",
            "Tele2",
            "Stockholm, SE",
            "http://speedtest.tele2.net/100MB.zip",
            "http://speedtest.tele2.net/upload.php",
            "http://speedtest.tele2.net/",
        ),
    ]
}
