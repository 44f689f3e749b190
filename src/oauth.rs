// src/oauth.rs
//! Authorization-code flow for the three posting platforms.
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::ClientCredentials;
use crate::error::{AgentError, Result};
use crate::post::Platform;

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: &'static [&'static str],
    /// TikTok names the client identifier `client_key`.
    pub client_id_param: &'static str,
}

impl Endpoints {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Instagram => Endpoints {
                authorize_url: "https://api.instagram.com/oauth/authorize".into(),
                token_url: "https://api.instagram.com/oauth/access_token".into(),
                scopes: &["user_profile", "user_media"],
                client_id_param: "client_id",
            },
            Platform::Facebook => Endpoints {
                authorize_url: "https://www.facebook.com/v10.0/dialog/oauth".into(),
                token_url: "https://graph.facebook.com/v10.0/oauth/access_token".into(),
                scopes: &["public_profile", "pages_manage_posts"],
                client_id_param: "client_id",
            },
            Platform::Tiktok => Endpoints {
                authorize_url: "https://open-api.tiktokglobalplatform.com/oauth/authorize".into(),
                token_url: "https://open-api.tiktokglobalplatform.com/oauth/token".into(),
                scopes: &["video.upload"],
                client_id_param: "client_key",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// How long an issued `state` stays redeemable.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);
/// Per-platform cap on outstanding states; the oldest is evicted first.
pub const MAX_PENDING_STATES: usize = 64;

pub struct OAuthClient {
    http: reqwest::Client,
    endpoints: HashMap<Platform, Endpoints>,
    pending: Mutex<HashMap<Platform, VecDeque<(String, Instant)>>>,
    state_ttl: Duration,
}

fn prune_expired(issued: &mut VecDeque<(String, Instant)>, ttl: Duration) {
    let now = Instant::now();
    issued.retain(|(_, at)| now.duration_since(*at) < ttl);
}

impl OAuthClient {
    pub fn new() -> Result<Self> {
        let endpoints = Platform::ALL
            .iter()
            .map(|p| (*p, Endpoints::for_platform(*p)))
            .collect();
        Self::with_endpoints(endpoints)
    }

    pub fn with_endpoints(endpoints: HashMap<Platform, Endpoints>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            http,
            endpoints,
            pending: Mutex::new(HashMap::new()),
            state_ttl: STATE_TTL,
        })
    }

    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    fn endpoints(&self, platform: Platform) -> Result<&Endpoints> {
        self.endpoints
            .get(&platform)
            .ok_or(AgentError::NotConfigured(platform))
    }

    /// Builds the consent URL and remembers its `state` for the callback.
    pub fn authorization_url(
        &self,
        platform: Platform,
        creds: &ClientCredentials,
    ) -> Result<(String, String)> {
        let ep = self.endpoints(platform)?;
        let state = uuid::Uuid::new_v4().simple().to_string();
        let scope = ep.scopes.join(",");

        let url = Url::parse_with_params(
            &ep.authorize_url,
            &[
                ("response_type", "code"),
                (ep.client_id_param, creds.client_id.as_str()),
                ("redirect_uri", creds.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| AgentError::Config(format!("bad authorize url for {platform}: {e}")))?;

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let issued = pending.entry(platform).or_default();
        prune_expired(issued, self.state_ttl);
        while issued.len() >= MAX_PENDING_STATES {
            issued.pop_front();
        }
        issued.push_back((state.clone(), Instant::now()));

        Ok((url.to_string(), state))
    }

    /// Consumes a pending `state`; fails if it was never issued, was evicted or expired.
    pub fn verify_state(&self, platform: Platform, state: Option<&str>) -> Result<()> {
        let state = state.ok_or_else(|| AgentError::OAuth {
            platform,
            message: "missing state parameter".into(),
        })?;
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let issued = pending.entry(platform).or_default();
        prune_expired(issued, self.state_ttl);
        match issued.iter().position(|(s, _)| s == state) {
            Some(idx) => {
                issued.remove(idx);
                Ok(())
            }
            None => Err(AgentError::OAuth {
                platform,
                message: "state mismatch".into(),
            }),
        }
    }

    /// Trades an authorization code for an access token.
    pub async fn exchange_code(
        &self,
        platform: Platform,
        creds: &ClientCredentials,
        code: &str,
    ) -> Result<String> {
        let ep = self.endpoints(platform)?;
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", creds.redirect_uri.as_str()),
            (ep.client_id_param, creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
        ];

        let resp = self.http.post(&ep.token_url).form(&form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AgentError::Platform {
                platform,
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| AgentError::OAuth {
            platform,
            message: format!("unreadable token response: {e}"),
        })?;
        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AgentError::OAuth {
                platform,
                message: parsed
                    .error_description
                    .or(parsed.error)
                    .unwrap_or_else(|| "no access_token in response".into()),
            }),
        }
    }
}
