// src/scrape.rs
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use scraper::{Html, Selector};
use serde::Serialize;
use std::time::Duration;

use crate::error::{AgentError, Result};

pub const NO_TITLE: &str = "No Title Found";
const MAX_PARAGRAPHS: usize = 5;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(http|https)://").expect("url regex"));
static SEL_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("title selector"));
static SEL_P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("p selector"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogContent {
    pub title: String,
    pub content: String,
}

pub fn validate_url(url: &str) -> Result<()> {
    if URL_RE.is_match(url) {
        Ok(())
    } else {
        Err(AgentError::InvalidUrl)
    }
}

pub fn build_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );

    Ok(reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(15))
        .redirect(Policy::limited(10))
        .default_headers(headers)
        .build()?)
}

/// `<title>` text (or [`NO_TITLE`]) plus the first five paragraphs joined by newlines.
pub fn parse_blog_html(html: &str) -> BlogContent {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&SEL_TITLE)
        .next()
        .map(|n| n.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let content = doc
        .select(&SEL_P)
        .take(MAX_PARAGRAPHS)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");

    BlogContent { title, content }
}

pub async fn fetch_blog_content(client: &reqwest::Client, url: &str) -> Result<BlogContent> {
    validate_url(url)?;

    let fetch_err = |message: String| AgentError::Fetch {
        url: url.to_string(),
        message,
    };

    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_err(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(fetch_err(format!("status {status}")));
    }
    let html = resp.text().await.map_err(|e| fetch_err(e.to_string()))?;

    let parsed = parse_blog_html(&html);
    tracing::info!(%url, title = %parsed.title, "fetched blog content");
    Ok(parsed)
}
