mod common;

use std::collections::HashMap;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use blog_repurposer::post::Platform;
use blog_repurposer::server::{self, parse_post_time};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn call(app: &common::TestApp, req: Request<Body>) -> Response {
    server::router(app.state.clone()).oneshot(req).await.unwrap()
}

async fn body_string(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn welcome_pages() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));

    let resp = call(&app, get("/")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("Welcome to Blog Repurposing Agent"));

    let resp = call(&app, get("/api")).await;
    assert_eq!(
        body_json(resp).await,
        json!({"message": "Welcome to the SEO Auto Blogger API"})
    );
}

#[tokio::test]
async fn fetch_content_rejects_non_http_urls() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));
    let resp = call(&app, post_json("/fetch_content", json!({"blog_url": "ftp://example.com"}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await, json!({"error": "Invalid URL format."}));

    let resp = call(&app, post_json("/fetch_content", json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fetch_content_scrapes_page() {
    common::init_tracing();
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>Scraped</title></head><body><p>a</p><p>b</p></body></html>",
            "text/html",
        ))
        .mount(&site)
        .await;

    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));
    let url = format!("{}/posts/1", site.uri());
    let resp = call(&app, post_json("/fetch_content", json!({"blog_url": url}))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"title": "Scraped", "content": "a\nb"}));
}

#[tokio::test]
async fn fetch_content_upstream_failure_is_bad_gateway() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/missing"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));
    let url = format!("{}/posts/missing", site.uri());
    let resp = call(&app, post_json("/fetch_content", json!({"blog_url": url}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("/posts/missing"), "{body}");
}

#[tokio::test]
async fn malformed_bodies_get_json_errors() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));

    let resp = call(&app, post_json("/generate-blog", json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());

    let raw = Request::post("/posts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = call(&app, raw).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());

    let resp = call(&app, post_form("/schedule", "title=x")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    assert!(body_json(resp).await["error"].is_string());

    let del = Request::delete("/schedule/jobs/not-a-uuid").body(Body::empty()).unwrap();
    let resp = call(&app, del).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn repurpose_accepts_repeated_platforms() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));
    let resp = call(
        &app,
        post_form(
            "/repurpose",
            "title=T&content=hello+world&platforms=Twitter&platforms=LinkedIn",
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({
            "LinkedIn": "[Optimized for LinkedIn] hello world...",
            "Twitter": "[Optimized for Twitter] hello world..."
        })
    );

    let resp = call(&app, post_form("/repurpose", "title=T")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_blog_defaults_and_validation() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));

    let resp = call(&app, post_json("/generate-blog", json!({"topic": "Home Composting"}))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let post = &body["blog_post"];
    assert_eq!(post["style"], "informative");
    assert_eq!(post["length"], "short");
    assert_eq!(post["slug"], "a-guide-to-home-composting");

    let resp = call(
        &app,
        post_json("/generate-blog", json!({"topic": "x", "style": "poetic"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn posts_feed_into_rss_route() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));

    let resp = call(&app, get("/rss.xml")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call(
        &app,
        post_json("/posts", json!({"title": "My New Post", "content": "fresh words"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(resp).await,
        json!({"filename": "my_new_post.txt", "items": 1})
    );

    let resp = call(&app, get("/rss.xml")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/rss+xml"
    );
    let xml = body_string(resp).await;
    assert!(xml.contains("<title>my_new_post</title>"));
    assert!(xml.contains("https://blog.example.com/blog/my_new_post"));
    assert!(app.dir.path().join("blog_posts/my_new_post.txt").exists());
}

#[tokio::test]
async fn authenticate_redirects_with_state() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));

    let resp = call(&app, get("/authenticate/instagram")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://api.instagram.com/oauth/authorize?"));
    let q: HashMap<_, _> = url::Url::parse(location)
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect();
    assert_eq!(q["client_id"], "ig-app");
    assert!(!q["state"].is_empty());

    // tiktok has no config section
    let resp = call(&app, get("/authenticate/tiktok")).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = call(&app, get("/authenticate/myspace")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn callback_stores_token() {
    common::init_tracing();
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/facebook/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fb-live"})))
        .expect(1)
        .mount(&api)
        .await;

    let app = common::test_app(&api.uri(), common::store_with(&[]));

    let resp = call(&app, get("/callback/facebook?code=abc&state=forged")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = call(&app, get("/authenticate/facebook")).await;
    let location = resp.headers()[header::LOCATION].to_str().unwrap().to_string();
    let state = url::Url::parse(&location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let resp = call(&app, get(&format!("/callback/facebook?code=abc&state={state}"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "Facebook authenticated successfully!");
    assert_eq!(app.state.agent.token(Platform::Facebook).as_deref(), Some("fb-live"));
}

#[tokio::test]
async fn schedule_form_and_jobs() {
    let app = common::test_app("http://127.0.0.1:9", common::store_with(&[]));

    let resp = call(&app, get("/schedule")).await;
    assert!(body_string(resp).await.contains("name='post_time'"));

    let resp = call(
        &app,
        post_form(
            "/schedule",
            "title=Later&content=body&image=&video=&url=https%3A%2F%2Fb.example.com&post_time=2099-01-01+09%3A30%3A00",
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "Post scheduled successfully!");

    let resp = call(&app, get("/schedule/jobs")).await;
    let jobs = body_json(resp).await;
    assert_eq!(jobs.as_array().unwrap().len(), 1);
    assert_eq!(jobs[0]["name"], "Later");
    let id = jobs[0]["id"].as_str().unwrap().to_string();

    let del = Request::delete(format!("/schedule/jobs/{id}")).body(Body::empty()).unwrap();
    assert_eq!(call(&app, del).await.status(), StatusCode::NO_CONTENT);
    assert!(app.state.agent.scheduler().jobs().is_empty());

    let resp = call(
        &app,
        post_form(
            "/schedule",
            "title=Bad&content=body&url=u&post_time=tomorrow",
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn post_time_format() {
    assert!(parse_post_time("2030-06-01 12:00:00").is_ok());
    assert!(parse_post_time("2030-06-01T12:00:00").is_err());
    assert!(parse_post_time("").is_err());
}
