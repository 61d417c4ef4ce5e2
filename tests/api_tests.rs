mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{PASSWORD, TestApp, spawn};

const BOUNDARY: &str = "olofooto-test-boundary";

fn router(app: &TestApp) -> Router {
    let state = olofooto::api::create_app_state(app.state.clone(), None);
    olofooto::api::router(state)
}

fn multipart_body(fields: &[(&str, &str)], image: Option<&[u8]>) -> Body {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"image\"; filename=\"pic.png\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

fn multipart_request(method: &str, uri: &str, token: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn registration_fields<'a>(email: &'a str, username: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("full_name", "Alice Liddell"),
        ("email", email),
        ("username", username),
        ("password", PASSWORD),
        ("gender", "female"),
        ("dob", "1990-05-04"),
    ]
}

async fn login(router: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            &json!({ "email": email, "password": PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["data"]["access_token"].as_str().unwrap().to_string(),
        body["data"]["refresh_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_register_verify_login_and_fetch_profile() {
    let app = spawn().await;
    let router = router(&app);

    let (status, body) = send(
        &router,
        multipart_request(
            "POST",
            "/api/v1/auth/register",
            None,
            multipart_body(&registration_fields("a@x.com", "alice"), Some(b"\x89PNG fake")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("password_hash").is_none());

    let code = app.otp_for("a@x.com").await.unwrap();
    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/v1/auth/verify-otp",
            None,
            &json!({ "email": "a@x.com", "otp": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/v1/auth/verify-otp",
            None,
            &json!({ "email": "a@x.com", "otp": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (access, refresh) = login(&router, "a@x.com").await;

    let (status, body) = send(&router, get("/api/v1/users/me", Some(&access))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["is_verified"], true);
    assert!(body["data"]["followers"].as_array().unwrap().is_empty());

    // A refresh token is not an access token, and vice versa.
    let (status, _) = send(&router, get("/api/v1/users/me", Some(&refresh))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &router,
        json_request("POST", "/api/v1/auth/refresh", Some(&access), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &router,
        json_request("POST", "/api/v1/auth/refresh", Some(&refresh), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["access_token"].is_string());
}

#[tokio::test]
async fn test_register_rejects_invalid_fields_and_duplicates() {
    let app = spawn().await;
    let router = router(&app);

    let (status, _) = send(
        &router,
        multipart_request(
            "POST",
            "/api/v1/auth/register",
            None,
            multipart_body(&registration_fields("not-an-email", "alice"), None),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &router,
        multipart_request(
            "POST",
            "/api/v1/auth/register",
            None,
            multipart_body(&registration_fields("a@x.com", "alice"), None),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &router,
        multipart_request(
            "POST",
            "/api/v1/auth/register",
            None,
            multipart_body(&registration_fields("a@x.com", "other"), None),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn test_protected_routes_require_bearer() {
    let app = spawn().await;
    let router = router(&app);

    let (status, body) = send(&router, get("/api/v1/users/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&router, get("/api/v1/users/me", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&router, get("/api/v1/tags/posts?name=travel", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_follow_like_and_tag_over_http() {
    let app = spawn().await;
    let router = router(&app);
    app.register("a@x.com", "alice").await;
    app.register("b@x.com", "bob").await;
    let (alice, _) = login(&router, "a@x.com").await;
    let (bob, _) = login(&router, "b@x.com").await;

    let (status, body) = send(
        &router,
        multipart_request(
            "POST",
            "/api/v1/posts",
            Some(&alice),
            multipart_body(&[("caption", "sunset"), ("tags", "Travel, beach")], Some(b"\x89PNG")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 2);

    let (status, _) = send(
        &router,
        json_request("POST", "/api/v1/users/alice/follow", Some(&bob), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &router,
        json_request("POST", "/api/v1/users/alice/follow", Some(&bob), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let like_uri = format!("/api/v1/posts/{post_id}/like");
    let like = || json_request("POST", &like_uri, Some(&bob), &json!({}));
    let (status, body) = send(&router, like()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "liked");

    let (_, body) = send(&router, like()).await;
    assert_eq!(body["data"]["status"], "unliked");

    let (status, body) = send(&router, get("/api/v1/tags/posts?name=%23travel", Some(&bob))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Bob cannot retag Alice's post.
    let tags_uri = format!("/api/v1/posts/{post_id}/tags");
    let (status, _) = send(
        &router,
        json_request("PUT", &tags_uri, Some(&bob), &json!({ "tags": ["mine"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&router, get("/api/v1/users/alice/posts", Some(&bob))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(&router, get("/api/v1/posts/not-a-uuid", Some(&bob))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn().await;
    let router = router(&app);

    let (status, body) = send(&router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}
