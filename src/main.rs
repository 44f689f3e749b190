// src/main.rs
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use blog_repurposer::BlogRepurposingAgent;
use blog_repurposer::config::{FeedSettings, OAuthConfig};
use blog_repurposer::generator::{self, Length, Style};
use blog_repurposer::oauth::OAuthClient;
use blog_repurposer::server::{self, AppState};
use blog_repurposer::social::{ApiBases, SocialClient};
use blog_repurposer::token_store::FileCredentialStore;
use blog_repurposer::{logging, rss_write, scrape};

#[derive(Parser)]
#[command(name = "blog-agent", version, about = "Blog repurposing agent and RSS publisher")]
struct Cli {
    /// Directory holding one `.txt` file per post
    #[arg(long, env = "BLOG_POSTS_DIR", default_value = "blog_posts", global = true)]
    posts_dir: PathBuf,

    #[arg(long, env = "RSS_FEED_FILE", default_value = "rss_feed.xml", global = true)]
    rss_file: PathBuf,

    #[arg(long, env = "SITE_URL", default_value = "https://yourdomain.com", global = true)]
    site_url: String,

    #[arg(long, env = "LOG_DIR", default_value = ".", global = true)]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
        bind: String,
        #[arg(long, env = "BLOG_AGENT_CONFIG", default_value = "config.json")]
        config: PathBuf,
        #[arg(long, env = "CREDENTIALS_FILE", default_value = "credentials.json")]
        credentials: PathBuf,
    },
    /// Regenerate the RSS feed from the posts directory
    Rss,
    /// Save a post and regenerate the feed
    AddPost {
        #[arg(long)]
        title: String,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the post body from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print a templated blog post for a topic
    Generate {
        topic: String,
        #[arg(long, default_value = "informative")]
        style: String,
        #[arg(long, default_value = "short")]
        length: String,
    },
    /// Fetch a blog page and print its title and opening paragraphs
    Fetch { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = logging::init(&cli.log_dir)?;
    tracing::debug!(log = %log_path.display(), "logging initialised");

    let feed = FeedSettings {
        posts_dir: cli.posts_dir,
        output_file: cli.rss_file,
        site_url: cli.site_url,
    };

    match cli.command {
        Command::Serve {
            bind,
            config,
            credentials,
        } => {
            let oauth_config = OAuthConfig::load(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let store = FileCredentialStore::open(&credentials)
                .with_context(|| format!("opening credential store {}", credentials.display()))?;
            let agent = BlogRepurposingAgent::new(SocialClient::new(ApiBases::default())?, Arc::new(store))?;
            tracing::info!(authenticated = ?agent.authenticated(), "agent ready");

            let state = Arc::new(AppState {
                agent: Arc::new(agent),
                oauth: OAuthClient::new()?,
                oauth_config,
                http: scrape::build_client()?,
                feed,
            });
            server::serve(state, &bind).await?;
        }
        Command::Rss => {
            let count = rss_write::create_rss_feed(&feed.posts_dir, &feed.output_file, &feed.site_url)?;
            println!("Updated RSS feed: {} ({count} items)", feed.output_file.display());
        }
        Command::AddPost { title, content, file } => {
            let body = match (content, file) {
                (Some(c), None) => c,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                _ => bail!("provide either --content or --file"),
            };
            let (filename, count) = rss_write::add_blog_post(&feed, &title, &body)?;
            println!("Blog post saved: {filename} (feed now has {count} items)");
        }
        Command::Generate { topic, style, length } => {
            let style: Style = style.parse()?;
            let length: Length = length.parse()?;
            let post = generator::generate_blog_post(&topic, style, length)?;
            println!("{}", serde_json::to_string_pretty(&post)?);
        }
        Command::Fetch { url } => {
            let client = scrape::build_client()?;
            let got = scrape::fetch_blog_content(&client, &url).await?;
            println!("{}\n\n{}", got.title, got.content);
        }
    }

    Ok(())
}
