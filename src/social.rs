// src/social.rs
use reqwest::header::AUTHORIZATION;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::post::{FacebookContent, InstagramContent, Platform, TiktokContent};

pub const INSTAGRAM_API_BASE: &str = "https://graph.instagram.com/";
pub const FACEBOOK_API_BASE: &str = "https://graph.facebook.com/v10.0/";
pub const TIKTOK_API_BASE: &str = "https://open-api.tiktokglobalplatform.com/";

#[derive(Debug, Clone)]
pub struct ApiBases {
    pub instagram: String,
    pub facebook: String,
    pub tiktok: String,
}

impl Default for ApiBases {
    fn default() -> Self {
        Self {
            instagram: INSTAGRAM_API_BASE.into(),
            facebook: FACEBOOK_API_BASE.into(),
            tiktok: TIKTOK_API_BASE.into(),
        }
    }
}

impl ApiBases {
    /// All three platforms behind one host (tests, proxies).
    pub fn single(base: &str) -> Self {
        let base = format!("{}/", base.trim_end_matches('/'));
        Self {
            instagram: base.clone(),
            facebook: base.clone(),
            tiktok: base,
        }
    }
}

#[derive(Clone)]
pub struct SocialClient {
    http: reqwest::Client,
    bases: ApiBases,
}

impl SocialClient {
    pub fn new(bases: ApiBases) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { http, bases })
    }

    pub async fn post_to_instagram(&self, token: &str, content: &InstagramContent) -> Result<Value> {
        let url = format!("{}me/media", self.bases.instagram);
        let form = [
            ("image_url", content.image.as_str()),
            ("caption", content.caption.as_str()),
        ];
        let req = self.http.post(url).header(AUTHORIZATION, bearer(token)).form(&form);
        send(Platform::Instagram, req).await
    }

    pub async fn post_to_facebook(&self, token: &str, content: &FacebookContent) -> Result<Value> {
        let url = format!("{}me/feed", self.bases.facebook);
        let form = [
            ("message", content.message.as_str()),
            ("link", content.link.as_str()),
        ];
        let req = self.http.post(url).header(AUTHORIZATION, bearer(token)).form(&form);
        send(Platform::Facebook, req).await
    }

    /// Streams the local video file as a multipart upload.
    pub async fn post_to_tiktok(&self, token: &str, content: &TiktokContent) -> Result<Value> {
        let url = format!("{}video/upload", self.bases.tiktok);
        let path = Path::new(&content.video);
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".into());

        let form = Form::new()
            .part(
                "video",
                Part::stream_with_length(Body::from(file), len).file_name(file_name),
            )
            .text("caption", content.caption.clone());
        let req = self
            .http
            .post(url)
            .header(AUTHORIZATION, bearer(token))
            .multipart(form);
        send(Platform::Tiktok, req).await
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

async fn send(platform: Platform, req: reqwest::RequestBuilder) -> Result<Value> {
    let resp = req.send().await?;
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(AgentError::Platform {
            platform,
            status: status.as_u16(),
            message: body.chars().take(300).collect(),
        });
    }
    // some endpoints answer 2xx with an empty body
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}
