mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{MemoryRepo, days_after, public_router};

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

/// Two authors, three tags and six posts; `python` is on three posts and
/// `django` on one.
fn seeded() -> (Arc<MemoryRepo>, tempfile::TempDir) {
    let repo = Arc::new(MemoryRepo::default());
    let alice = repo.add_user("alice");
    let bob = repo.add_user("bob");
    let python = repo.add_tag("python");
    let django = repo.add_tag("django");
    let rust = repo.add_tag("rust lang");

    let titles = [
        ("First steps", "first-steps"),
        ("Second wind", "second-wind"),
        ("Third time", "third-time"),
        ("Fourth wall", "fourth-wall"),
        ("Fifth element", "fifth-element"),
        ("Sixth sense", "sixth-sense"),
    ];
    let ids: Vec<_> = titles
        .iter()
        .enumerate()
        .map(|(day, (title, slug))| repo.add_post(alice, title, slug, days_after(day as i64)))
        .collect();

    repo.tag_post(ids[0], python);
    repo.tag_post(ids[1], python);
    repo.tag_post(ids[2], python);
    repo.tag_post(ids[2], django);
    repo.tag_post(ids[3], rust);

    repo.like(ids[0], alice);
    repo.like(ids[0], bob);
    repo.add_comment(ids[0], bob, "Nice read", days_after(10));
    repo.add_comment(ids[0], alice, "Thanks!", days_after(11));

    let media = tempfile::tempdir().expect("temp dir");
    (repo, media)
}

#[tokio::test]
async fn index_lists_five_fresh_posts_and_sidebars() {
    let (repo, media) = seeded();
    let app = public_router(repo, media.path());

    let (status, _, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);

    assert!(body.contains("Sixth sense"));
    assert!(body.contains("Second wind"));
    let main = body.split("<aside").next().expect("main content");
    assert!(
        !main.contains("First steps"),
        "oldest post falls outside the fresh five"
    );

    let aside = body.split("<aside").nth(1).expect("sidebar");
    assert!(aside.contains("First steps"), "most liked post leads the sidebar");
    let python_at = aside.find("#python").expect("python in popular tags");
    let django_at = aside.find("#django").expect("django in popular tags");
    assert!(python_at < django_at);
    assert!(aside.contains("<span class=\"count\">3</span>"));
}

#[tokio::test]
async fn post_detail_renders_comments_oldest_first() {
    let (repo, media) = seeded();
    let app = public_router(repo, media.path());

    let (status, _, body) = get(&app, "/posts/first-steps/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>First steps · Lectern</title>"));
    assert!(body.contains("2 likes"));
    assert!(body.contains("Comments (2)"));

    let first = body.find("Nice read").expect("first comment");
    let second = body.find("Thanks!").expect("second comment");
    assert!(first < second);
}

#[tokio::test]
async fn unknown_slug_and_tag_render_not_found_page() {
    let (repo, media) = seeded();
    let app = public_router(repo, media.path());

    for uri in ["/posts/missing/", "/tags/missing/", "/nowhere"] {
        let (status, _, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(body.contains("Page Not Found"), "{uri}");
    }
}

#[tokio::test]
async fn tag_page_filters_by_exact_title() {
    let (repo, media) = seeded();
    let app = public_router(repo, media.path());

    let (status, _, body) = get(&app, "/tags/rust%20lang/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Posts tagged #rust lang"));
    let main = body.split("<aside").next().expect("main content");
    assert!(main.contains("Fourth wall"));
    assert!(!main.contains("Fifth element"));

    let (status, _, _) = get(&app, "/tags/Python/").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bare_urls_redirect_to_trailing_slash() {
    let (repo, media) = seeded();
    let app = public_router(repo, media.path());

    let cases = [
        ("/contacts", "/contacts/"),
        ("/posts/first-steps", "/posts/first-steps/"),
        ("/tags/rust%20lang", "/tags/rust%20lang/"),
    ];
    for (from, to) in cases {
        let (status, headers, _) = get(&app, from).await;
        assert_eq!(status, StatusCode::PERMANENT_REDIRECT, "{from}");
        assert_eq!(
            headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some(to)
        );
    }
}

#[tokio::test]
async fn contacts_page_is_static() {
    let repo = Arc::new(MemoryRepo::default());
    let media = tempfile::tempdir().expect("temp dir");
    let app = public_router(repo, media.path());

    let (status, _, body) = get(&app, "/contacts/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>Contacts · Lectern</title>"));
    assert!(body.contains("href=\"/contacts/\""));
}

#[tokio::test]
async fn empty_store_still_renders_index() {
    let repo = Arc::new(MemoryRepo::default());
    let media = tempfile::tempdir().expect("temp dir");
    let app = public_router(repo, media.path());

    let (status, _, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Nothing published yet."));
}

#[tokio::test]
async fn media_files_are_served_with_guessed_type() {
    let (repo, media) = seeded();
    let dir = media.path().join("posts/2024/03");
    std::fs::create_dir_all(&dir).expect("create media dir");
    std::fs::write(dir.join("cover.png"), b"png-bytes").expect("write media file");
    let app = public_router(repo, media.path());

    let (status, headers, body) = get(&app, "/media/posts/2024/03/cover.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(body, "png-bytes");

    let (status, _, _) = get(&app, "/media/posts/missing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_images_resolve_under_media_prefix() {
    let (repo, media) = seeded();
    let post_id = repo.add_post(
        repo.add_user("carol"),
        "Seventh seal",
        "seventh-seal",
        days_after(30),
    );
    repo.set_image(post_id, "posts/2024/04/seal.png");
    let app = public_router(repo, media.path());

    let (status, _, body) = get(&app, "/posts/seventh-seal/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("src=\"/media/posts/2024/04/seal.png\""));
}

#[tokio::test]
async fn health_reports_database_state() {
    let media = tempfile::tempdir().expect("temp dir");

    let healthy = public_router(Arc::new(MemoryRepo::default()), media.path());
    let (status, _, _) = get(&healthy, "/_health/db").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let failing = public_router(Arc::new(MemoryRepo::with_failing_health()), media.path());
    let (status, _, _) = get(&failing, "/_health/db").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
