// src/rss_write.rs
use chrono::{DateTime, Utc};
use rss::{ChannelBuilder, Item, ItemBuilder};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::FeedSettings;
use crate::error::{AgentError, Result};
use crate::post::truncate_chars;

pub const CHANNEL_TITLE: &str = "AI Auto-Blogger RSS Feed";
pub const CHANNEL_DESC: &str = "Automated blog posts from AI Auto-Blogger SaaS";
const PREVIEW_CHARS: usize = 200;

/// Rebuilds the feed from every `.txt` file in `posts_dir`. Returns the item count.
pub fn create_rss_feed(posts_dir: &Path, output_file: &Path, site_url: &str) -> Result<usize> {
    fs::create_dir_all(posts_dir)?;

    let mut files: Vec<PathBuf> = fs::read_dir(posts_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    // newest-named first
    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let site = site_url.trim_end_matches('/');
    let items = files
        .iter()
        .map(|path| build_item(path, site))
        .collect::<Result<Vec<Item>>>()?;
    let count = items.len();

    let channel = ChannelBuilder::default()
        .title(CHANNEL_TITLE)
        .link(site)
        .description(CHANNEL_DESC)
        .last_build_date(Some(Utc::now().to_rfc2822()))
        .items(items)
        .build();

    if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(output_file)?);
    let mut writer = channel
        .write_to(writer)
        .map_err(|e| AgentError::Feed(e.to_string()))?;
    writer.flush()?;

    tracing::info!(file = %output_file.display(), items = count, "updated RSS feed");
    Ok(count)
}

fn build_item(path: &Path, site: &str) -> Result<Item> {
    let content = fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let pub_date = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
        .to_rfc2822();

    Ok(ItemBuilder::default()
        .title(Some(stem.clone()))
        .link(Some(format!("{site}/blog/{stem}")))
        .description(Some(format!("{}...", truncate_chars(&content, PREVIEW_CHARS))))
        .pub_date(Some(pub_date))
        .build())
}

/// `"My Post"` -> `"my_post.txt"`. Rejects names that would escape the posts directory.
pub fn post_filename(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AgentError::InvalidInput("title must not be empty".into()));
    }
    if title.contains('/') || title.contains('\\') || title.contains("..") {
        return Err(AgentError::InvalidInput(format!(
            "title contains a path separator: {title}"
        )));
    }
    Ok(format!("{}.txt", title.replace(' ', "_").to_lowercase()))
}

/// Saves a post and regenerates the feed. Returns `(filename, item_count)`.
pub fn add_blog_post(settings: &FeedSettings, title: &str, content: &str) -> Result<(String, usize)> {
    let filename = post_filename(title)?;
    fs::create_dir_all(&settings.posts_dir)?;
    fs::write(settings.posts_dir.join(&filename), content)?;
    tracing::info!(%filename, "blog post saved");

    let count = create_rss_feed(&settings.posts_dir, &settings.output_file, &settings.site_url)?;
    Ok((filename, count))
}
