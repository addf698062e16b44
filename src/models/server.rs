//! Server profile data model

use serde::{Deserialize, Serialize};

/// Resolved endpoint information for one logical test server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// Registry key, e.g. `hetzner`
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Where the server lives, for display only
    pub location: String,

    /// Fixed-size test object fetched by the download phase
    pub download_url: String,

    /// Echo/ingest endpoint receiving the upload payload
    pub upload_url: String,

    /// Lightweight endpoint used for latency probes
    pub probe_url: String,
}

impl ServerProfile {
    pub fn new(
        id: &str,
        name: &str,
        location: &str,
        download_url: &str,
        upload_url: &str,
        probe_url: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            location: location.to_string(),
            download_url: download_url.to_string(),
            upload_url: upload_url.to_string(),
            probe_url: probe_url.to_string(),
        }
    }

    /// Profile pointing every endpoint at paths below one base URL
    pub fn with_base_url(id: &str, name: &str, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self::new(
            id,
            name,
            "custom",
            &format!("{}/download", base),
            &format!("{}/upload", base),
            &format!("{}/ping", base),
        )
    }

    /// Label used in tables: `Name (location)`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.location)
    }

    /// Check that every endpoint is an absolute http(s) URL
    pub fn validate(&self) -> crate::Result<()> {
        for (label, value) in [
            ("download", &self.download_url),
            ("upload", &self.upload_url),
            ("probe", &self.probe_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                crate::AppError::validation(format!(
                    "Server '{}' has an invalid {} URL '{}': {}",
                    self.id, label, value, e
                ))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(crate::AppError::validation(format!(
                    "Server '{}' {} URL must use http or https: {}",
                    self.id, label, value
                )));
            }
        }
        Ok(())
    }
}
