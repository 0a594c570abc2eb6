use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn config() -> iam_core::ConfigStore {
    let mut cfg = iam_server::config::defaults();
    cfg.set("signing.secret", "server-test-secret-0123456789");
    cfg.set("seed.organizations", "acme, labs");
    cfg
}

#[tokio::test]
async fn health_and_context_are_served() {
    let ax = iam_server::build(&config().snapshot()).unwrap();
    let router = ax.into_router();

    let res = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());

    let res = router
        .oneshot(Request::builder().uri("/auth/context?org=labs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["organization"]["slug"], "labs");
    assert_eq!(body["privilege"], json!(null));
}

#[test]
fn missing_signing_secret_is_fatal() {
    let cfg = iam_server::config::defaults();
    assert!(iam_server::build(&cfg.snapshot()).is_err());
}

#[test]
fn unknown_verification_policy_is_fatal() {
    let mut cfg = config();
    cfg.set("iam.email_verification", "sometimes");
    assert!(iam_server::build(&cfg.snapshot()).is_err());
}

#[test]
fn bind_addr_reads_http_keys() {
    let mut cfg = config();
    cfg.set("http.port", "8081");
    assert_eq!(iam_server::bind_addr(&cfg.snapshot()), "127.0.0.1:8081");
}
