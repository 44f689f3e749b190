// src/post.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    Tiktok,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Instagram, Platform::Facebook, Platform::Tiktok];

    /// Lowercase identifier used in routes, config keys and credential keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Tiktok => "tiktok",
        }
    }

    pub fn token_key(&self) -> String {
        format!("{}_token", self.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Tiktok => "TikTok",
        };
        f.write_str(label)
    }
}

impl FromStr for Platform {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "facebook" => Ok(Platform::Facebook),
            "tiktok" => Ok(Platform::Tiktok),
            _ => Err(AgentError::UnknownPlatform(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub content: String,
    pub image: String, // image URL
    pub video: String, // local video path
    pub url: String,   // canonical blog URL
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstagramContent {
    pub image: String,
    pub caption: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacebookContent {
    pub message: String,
    pub link: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TiktokContent {
    pub video: String,
    pub caption: String,
}

impl BlogPost {
    pub fn instagram_content(&self) -> InstagramContent {
        InstagramContent {
            image: self.image.clone(),
            caption: format!(
                "{}\n\n{}... #ReadMoreOnBlog",
                self.title,
                truncate_chars(&self.content, 200)
            ),
        }
    }

    pub fn facebook_content(&self) -> FacebookContent {
        FacebookContent {
            message: format!(
                "{}\n\n{}... Read the full blog here: {}",
                self.title,
                truncate_chars(&self.content, 300),
                self.url
            ),
            link: self.url.clone(),
        }
    }

    pub fn tiktok_content(&self) -> TiktokContent {
        TiktokContent {
            video: self.video.clone(),
            caption: format!("{} \n\n Learn more: {}", self.title, self.url),
        }
    }
}

impl fmt::Display for BlogPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.title, self.url)
    }
}

/// Quick per-label preview used by the `/repurpose` form. Labels are free-form.
pub fn repurpose_preview(content: &str, platforms: &[String]) -> BTreeMap<String, String> {
    platforms
        .iter()
        .map(|p| {
            (
                p.clone(),
                format!("[Optimized for {}] {}...", p, truncate_chars(content, 250)),
            )
        })
        .collect()
}

/// First `max` chars (not bytes) of `s`.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
