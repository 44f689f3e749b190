// src/server.rs
use axum::{
    Form, Router,
    extract::{
        FromRequest, Path, Query, RawForm, Request, State,
        rejection::{FormRejection, JsonRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Json, Redirect},
    routing::{delete, get, post},
};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::agent::BlogRepurposingAgent;
use crate::config::{FeedSettings, OAuthConfig};
use crate::error::{AgentError, Result};
use crate::generator::{self, GeneratedPost, Length, Style};
use crate::oauth::OAuthClient;
use crate::post::{BlogPost, Platform, repurpose_preview};
use crate::rss_write;
use crate::scheduler::JobInfo;
use crate::scrape::{self, BlogContent};

pub const POST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct AppState {
    pub agent: Arc<BlogRepurposingAgent>,
    pub oauth: OAuthClient,
    pub oauth_config: OAuthConfig,
    pub http: reqwest::Client,
    pub feed: FeedSettings,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api", get(api_root))
        .route("/authenticate/{platform}", get(authenticate))
        .route("/callback/{platform}", get(oauth_callback))
        .route("/schedule", get(schedule_form).post(schedule_submit))
        .route("/schedule/jobs", get(list_jobs))
        .route("/schedule/jobs/{id}", delete(cancel_job))
        .route("/fetch_content", post(fetch_content))
        .route("/repurpose", post(repurpose))
        .route("/generate-blog", post(generate_blog))
        .route("/posts", post(add_post))
        .route("/rss.xml", get(serve_rss))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// --- Extractors ---

/// `Json` whose rejection is reported as a JSON `{"error": ...}` body.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AgentError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rej| AgentError::InvalidInput(rej.body_text()))?;
        Ok(Self(value))
    }
}

/// Urlencoded counterpart of [`ApiJson`].
pub struct ApiForm<T>(pub T);

impl<S, T> FromRequest<S> for ApiForm<T>
where
    Form<T>: FromRequest<S, Rejection = FormRejection>,
    S: Send + Sync,
{
    type Rejection = AgentError;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rej| AgentError::InvalidInput(rej.body_text()))?;
        Ok(Self(value))
    }
}

// --- Request structs ---

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
pub struct ScheduleForm {
    title: String,
    content: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    video: String,
    url: String,
    post_time: String,
}

#[derive(Deserialize)]
pub struct FetchRequest {
    blog_url: Option<String>,
}

#[derive(Deserialize)]
pub struct BlogRequest {
    topic: String,
    style: Option<String>,
    length: Option<String>,
}

#[derive(Deserialize)]
pub struct NewPost {
    title: String,
    content: String,
}

// --- Handlers ---

async fn index() -> Html<&'static str> {
    Html("<h1>Welcome to Blog Repurposing Agent</h1>")
}

async fn api_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the SEO Auto Blogger API" }))
}

async fn authenticate(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
) -> Result<Redirect> {
    let platform: Platform = platform.parse()?;
    let creds = state.oauth_config.credentials(platform)?;
    let (url, _state) = state.oauth.authorization_url(platform, creds)?;
    tracing::info!(%platform, "redirecting to authorization page");
    Ok(Redirect::to(&url))
}

async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(q): Query<CallbackQuery>,
) -> Result<String> {
    let platform: Platform = platform.parse()?;
    state.oauth.verify_state(platform, q.state.as_deref())?;

    if let Some(err) = q.error {
        return Err(AgentError::OAuth {
            platform,
            message: q.error_description.unwrap_or(err),
        });
    }
    let code = q.code.filter(|c| !c.is_empty()).ok_or_else(|| AgentError::OAuth {
        platform,
        message: "missing code parameter".into(),
    })?;

    let creds = state.oauth_config.credentials(platform)?;
    let token = state.oauth.exchange_code(platform, creds, &code).await?;
    let agent = Arc::clone(&state.agent);
    tokio::task::spawn_blocking(move || agent.store_token(platform, token))
        .await
        .map_err(|e| AgentError::Config(format!("credential write task failed: {e}")))??;
    Ok(format!("{platform} authenticated successfully!"))
}

async fn schedule_form() -> Html<&'static str> {
    Html(
        r#"
    <form method='POST'>
        Title: <input type='text' name='title'><br>
        Content: <textarea name='content'></textarea><br>
        Image URL: <input type='text' name='image'><br>
        Video Path: <input type='text' name='video'><br>
        Blog URL: <input type='text' name='url'><br>
        Post Time (YYYY-MM-DD HH:MM:SS): <input type='text' name='post_time'><br>
        <input type='submit' value='Schedule'>
    </form>
    "#,
    )
}

/// Parses `YYYY-MM-DD HH:MM:SS` as server-local time.
pub fn parse_post_time(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), POST_TIME_FORMAT).map_err(|e| {
        AgentError::InvalidInput(format!("post_time must be YYYY-MM-DD HH:MM:SS: {e}"))
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AgentError::InvalidInput(format!("post_time {raw} does not exist locally")))
}

async fn schedule_submit(
    State(state): State<Arc<AppState>>,
    ApiForm(form): ApiForm<ScheduleForm>,
) -> Result<String> {
    let run_time = parse_post_time(&form.post_time)?;
    let post = BlogPost {
        title: form.title,
        content: form.content,
        image: form.image,
        video: form.video,
        url: form.url,
    };
    let id = state.agent.schedule_post(post, run_time);
    tracing::info!(%id, %run_time, "scheduled blog post");
    Ok("Post scheduled successfully!".to_string())
}

async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobInfo>> {
    Json(state.agent.scheduler().jobs())
}

async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id: Uuid = id
        .parse()
        .map_err(|_| AgentError::NotFound(format!("no scheduled job {id}")))?;
    if state.agent.scheduler().cancel(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AgentError::NotFound(format!("no scheduled job {id}")))
    }
}

async fn fetch_content(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<FetchRequest>,
) -> Result<Json<BlogContent>> {
    let url = req.blog_url.unwrap_or_default();
    Ok(Json(scrape::fetch_blog_content(&state.http, &url).await?))
}

/// Urlencoded `title`, `content` and any number of `platforms` fields.
async fn repurpose(RawForm(body): RawForm) -> Result<Json<BTreeMap<String, String>>> {
    let mut content = None;
    let mut platforms = Vec::new();
    for (k, v) in url::form_urlencoded::parse(&body) {
        match k.as_ref() {
            "content" => content = Some(v.into_owned()),
            "platforms" => platforms.push(v.into_owned()),
            _ => {}
        }
    }
    let content = content.ok_or_else(|| AgentError::InvalidInput("content is required".into()))?;
    Ok(Json(repurpose_preview(&content, &platforms)))
}

async fn generate_blog(ApiJson(req): ApiJson<BlogRequest>) -> Result<Json<BTreeMap<&'static str, GeneratedPost>>> {
    let style = req.style.as_deref().map(str::parse::<Style>).transpose()?.unwrap_or_default();
    let length = req.length.as_deref().map(str::parse::<Length>).transpose()?.unwrap_or_default();
    let result = generator::generate_blog_post(&req.topic, style, length)?;
    Ok(Json(BTreeMap::from([("blog_post", result)])))
}

async fn add_post(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewPost>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let feed = state.feed.clone();
    let (filename, items) =
        tokio::task::spawn_blocking(move || rss_write::add_blog_post(&feed, &req.title, &req.content))
            .await
            .map_err(|e| AgentError::Feed(e.to_string()))??;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "filename": filename, "items": items })),
    ))
}

async fn serve_rss(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse> {
    let bytes = match tokio::fs::read(&state.feed.output_file).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AgentError::NotFound("rss feed has not been generated".into()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(([(header::CONTENT_TYPE, "application/rss+xml")], bytes))
}

/// Binds, regenerates the feed once, and serves until Ctrl-C.
pub async fn serve(state: Arc<AppState>, bind_addr: &str) -> anyhow::Result<()> {
    let feed = state.feed.clone();
    let count = tokio::task::spawn_blocking(move || {
        rss_write::create_rss_feed(&feed.posts_dir, &feed.output_file, &feed.site_url)
    })
    .await??;
    tracing::info!(items = count, "initial RSS feed written");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let agent = Arc::clone(&state.agent);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    agent.scheduler().shutdown();
    Ok(())
}
