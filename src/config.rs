// src/config.rs
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AgentError, Result};
use crate::post::Platform;

/// One platform's OAuth application credentials.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientCredentials {
    #[serde(alias = "client_key")]
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Contents of `config.json`. Every platform section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub instagram: Option<ClientCredentials>,
    #[serde(default)]
    pub facebook: Option<ClientCredentials>,
    #[serde(default)]
    pub tiktok: Option<ClientCredentials>,
}

impl OAuthConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AgentError::Config(format!(
                "configuration file {} not found",
                path.display()
            )));
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| AgentError::Config(format!("invalid config: {e}")))
    }

    pub fn credentials(&self, platform: Platform) -> Result<&ClientCredentials> {
        match platform {
            Platform::Instagram => self.instagram.as_ref(),
            Platform::Facebook => self.facebook.as_ref(),
            Platform::Tiktok => self.tiktok.as_ref(),
        }
        .ok_or(AgentError::NotConfigured(platform))
    }
}

/// Where posts live and where the feed goes.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub posts_dir: PathBuf,
    pub output_file: PathBuf,
    pub site_url: String,
}
