// src/lib.rs
pub mod agent;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod oauth;
pub mod post;
pub mod rss_write;
pub mod scheduler;
pub mod scrape;
pub mod server;
pub mod social;
pub mod token_store;

pub use agent::{BlogRepurposingAgent, PostOutcome, RepurposeReport};
pub use error::{AgentError, Result};
pub use post::{BlogPost, Platform};
