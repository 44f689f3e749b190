// src/agent.rs
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::Result;
use crate::post::{BlogPost, Platform};
use crate::scheduler::Scheduler;
use crate::social::SocialClient;
use crate::token_store::{CredentialStore, SERVICE};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PostOutcome {
    Posted { response: Value },
    Failed { error: String },
    Skipped,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepurposeReport {
    pub outcomes: BTreeMap<Platform, PostOutcome>,
}

impl RepurposeReport {
    pub fn posted(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, PostOutcome::Posted { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, PostOutcome::Failed { .. }))
            .count()
    }
}

pub struct BlogRepurposingAgent {
    social: SocialClient,
    store: Arc<dyn CredentialStore>,
    tokens: RwLock<HashMap<Platform, String>>,
    scheduler: Scheduler,
}

impl BlogRepurposingAgent {
    /// Loads whatever tokens the credential store already holds.
    pub fn new(social: SocialClient, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let mut tokens = HashMap::new();
        for platform in Platform::ALL {
            if let Some(token) = store.get(SERVICE, &platform.token_key())? {
                tracing::debug!(%platform, "loaded cached token");
                tokens.insert(platform, token);
            }
        }
        Ok(Self {
            social,
            store,
            tokens: RwLock::new(tokens),
            scheduler: Scheduler::new(),
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn token(&self, platform: Platform) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&platform)
            .cloned()
    }

    pub fn authenticated(&self) -> Vec<Platform> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        Platform::ALL.into_iter().filter(|p| tokens.contains_key(p)).collect()
    }

    pub fn store_token(&self, platform: Platform, token: String) -> Result<()> {
        self.store.set(SERVICE, &platform.token_key(), &token)?;
        self.tokens
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(platform, token);
        tracing::info!(%platform, "authenticated successfully");
        Ok(())
    }

    /// Posts derived content to every authenticated platform concurrently.
    /// Per-platform failures are recorded, never propagated.
    pub async fn repurpose_blog(&self, post: &BlogPost) -> RepurposeReport {
        let mut report = RepurposeReport::default();
        let mut tasks = Vec::new();

        for platform in Platform::ALL {
            match self.token(platform) {
                Some(token) => tasks.push(self.post_one(platform, token, post)),
                None => {
                    report.outcomes.insert(platform, PostOutcome::Skipped);
                }
            }
        }

        for (platform, result) in join_all(tasks).await {
            let outcome = match result {
                Ok(response) => {
                    tracing::info!(%platform, %response, "successfully posted");
                    PostOutcome::Posted { response }
                }
                Err(e) => {
                    tracing::error!(%platform, error = %e, "failed to post");
                    PostOutcome::Failed { error: e.to_string() }
                }
            };
            report.outcomes.insert(platform, outcome);
        }

        tracing::info!(
            title = %post.title,
            posted = report.posted(),
            failed = report.failed(),
            "repurposed blog content"
        );
        report
    }

    async fn post_one(&self, platform: Platform, token: String, post: &BlogPost) -> (Platform, Result<Value>) {
        let result = match platform {
            Platform::Instagram => {
                self.social
                    .post_to_instagram(&token, &post.instagram_content())
                    .await
            }
            Platform::Facebook => {
                self.social
                    .post_to_facebook(&token, &post.facebook_content())
                    .await
            }
            Platform::Tiktok => self.social.post_to_tiktok(&token, &post.tiktok_content()).await,
        };
        (platform, result)
    }

    pub fn schedule_post(self: &Arc<Self>, post: BlogPost, run_time: DateTime<Utc>) -> Uuid {
        let agent = Arc::clone(self);
        let name = post.title.clone();
        self.scheduler.schedule(name, run_time, move || async move {
            agent.repurpose_blog(&post).await;
        })
    }
}
