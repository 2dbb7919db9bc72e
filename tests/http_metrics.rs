mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use tower::ServiceExt;

use common::{MemoryRepo, public_router};
use lectern::infra::telemetry::{HTTP_RESPONSE_MS, HTTP_RESPONSES_TOTAL, describe_metrics};

#[tokio::test]
async fn responses_are_counted_by_status_class() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    describe_metrics();

    let media = tempfile::tempdir().expect("temp dir");
    let app = public_router(Arc::new(MemoryRepo::default()), media.path());

    for (uri, expected) in [
        ("/", StatusCode::OK),
        ("/contacts/", StatusCode::OK),
        ("/posts/missing/", StatusCode::NOT_FOUND),
    ] {
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
        assert_eq!(response.status(), expected);
    }

    let mut ok = 0;
    let mut client_errors = 0;
    let mut timings = 0;
    for (key, _, _, value) in snapshotter.snapshot().into_vec() {
        let name = key.key().name();
        if name == HTTP_RESPONSES_TOTAL {
            let class = key
                .key()
                .labels()
                .find(|label| label.key() == "status_class")
                .map(|label| label.value().to_string());
            if let DebugValue::Counter(count) = value {
                match class.as_deref() {
                    Some("2xx") => ok += count,
                    Some("4xx") => client_errors += count,
                    _ => {}
                }
            }
        } else if name == HTTP_RESPONSE_MS {
            if let DebugValue::Histogram(samples) = value {
                timings += samples.len();
            }
        }
    }

    assert_eq!(ok, 2);
    assert_eq!(client_errors, 1);
    assert_eq!(timings, 3);
}
