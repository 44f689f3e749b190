#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};

use blog_repurposer::BlogRepurposingAgent;
use blog_repurposer::config::{FeedSettings, OAuthConfig};
use blog_repurposer::oauth::{Endpoints, OAuthClient};
use blog_repurposer::post::{BlogPost, Platform};
use blog_repurposer::server::AppState;
use blog_repurposer::social::{ApiBases, SocialClient};
use blog_repurposer::token_store::{CredentialStore, MemoryCredentialStore, SERVICE};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const CONFIG_JSON: &str = r#"{
    "instagram": {"client_id": "ig-app", "client_secret": "ig-secret", "redirect_uri": "http://localhost:5000/callback/instagram"},
    "facebook": {"client_id": "fb-app", "client_secret": "fb-secret", "redirect_uri": "http://localhost:5000/callback/facebook"}
}"#;

pub fn sample_post() -> BlogPost {
    BlogPost {
        title: "Shipping Rust Services".into(),
        content: "Rust services are pleasant to operate. ".repeat(20),
        image: "https://cdn.example.com/cover.png".into(),
        video: "/nonexistent/clip.mp4".into(),
        url: "https://blog.example.com/shipping-rust".into(),
    }
}

/// Credential store pre-seeded with the given tokens.
pub fn store_with(tokens: &[(Platform, &str)]) -> Arc<MemoryCredentialStore> {
    let store = MemoryCredentialStore::default();
    for (platform, token) in tokens {
        store.set(SERVICE, &platform.token_key(), token).unwrap();
    }
    Arc::new(store)
}

/// OAuth endpoints whose token URLs point at `base`.
pub fn oauth_against(base: &str) -> OAuthClient {
    let endpoints: HashMap<Platform, Endpoints> = Platform::ALL
        .iter()
        .map(|p| {
            let mut ep = Endpoints::for_platform(*p);
            ep.token_url = format!("{base}/{}/token", p.as_str());
            (*p, ep)
        })
        .collect();
    OAuthClient::with_endpoints(endpoints).unwrap()
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub dir: tempfile::TempDir,
}

/// App state rooted in a temp dir; social and token calls go to `api_base`.
pub fn test_app(api_base: &str, store: Arc<MemoryCredentialStore>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let agent = BlogRepurposingAgent::new(
        SocialClient::new(ApiBases::single(api_base)).unwrap(),
        store,
    )
    .unwrap();

    let state = Arc::new(AppState {
        agent: Arc::new(agent),
        oauth: oauth_against(api_base),
        oauth_config: OAuthConfig::from_json(CONFIG_JSON).unwrap(),
        http: reqwest::Client::new(),
        feed: FeedSettings {
            posts_dir: dir.path().join("blog_posts"),
            output_file: dir.path().join("rss_feed.xml"),
            site_url: "https://blog.example.com".into(),
        },
    });
    TestApp { state, dir }
}
