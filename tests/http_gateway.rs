use std::collections::HashMap;
use std::sync::Arc;

use buzzzy_client::client::app::ClientApp;
use buzzzy_client::client::config::ClientConfig;
use buzzzy_client::client::models::session::SessionReader;
use buzzzy_client::client::models::ui_state::ViewState;
use buzzzy_client::client::services::gateway::{Mutation, Polarity, ToggleKind};
use buzzzy_client::client::services::media_service::MediaFile;
use buzzzy_client::client::utils::session_store::{KeyValueStore, MemoryStore, TOKEN_KEY};
use buzzzy_client::client::views::post_detail::PostDetailView;
use buzzzy_client::common::error::ClientError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(server: &MockServer) -> ClientApp {
    let vars: HashMap<&str, String> = HashMap::from([
        ("BUZZZY_AUTH_URL", format!("{}/auth", server.uri())),
        ("BUZZZY_API_URL", format!("{}/api", server.uri())),
        ("BUZZZY_UPLOAD_URL", format!("{}/upload", server.uri())),
    ]);
    let config = ClientConfig::from_lookup(|key| vars.get(key).cloned());
    ClientApp::from_config(config, Arc::new(MemoryStore::new())).unwrap()
}

fn me() -> serde_json::Value {
    json!({"id": "u1", "username": "alice", "email": "alice@example.com", "is_admin": false})
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_partial_json(json!({"action": "login", "email": "alice@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-1",
            "user": {"id": "u1", "username": "alice"}
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth"))
        .and(query_param("action", "me"))
        .and(header("X-Auth-Token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_then_reads_carry_the_token() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("action", "feed"))
        .and(query_param("offset", "0"))
        .and(header("X-Auth-Token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "p1",
            "content": "first",
            "user": {"id": "u2", "username": "bob"},
            "likes_count": 3,
            "created_at": "2024-05-01 12:00:00"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server);
    let user = app.auth.login("alice@example.com", "secret").await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(app.session.current_user_id().as_deref(), Some("u1"));

    let feed = app.gateway.feed(0).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].likes_count, 3);
}

#[tokio::test]
async fn blocked_login_reports_block_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"error": "blocked", "block_count": 2})),
        )
        .mount(&server)
        .await;

    let app = app_for(&server);
    let err = app.auth.login("alice@example.com", "secret").await.unwrap_err();
    assert!(matches!(err, ClientError::Blocked { block_count: 2 }));
    assert!(!app.session.has_token());
}

#[tokio::test]
async fn wrong_password_is_an_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})))
        .mount(&server)
        .await;

    let app = app_for(&server);
    let err = app.auth.login("alice@example.com", "nope").await.unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn missing_post_becomes_not_found_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("action", "post"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Post not found"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("action", "comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = app_for(&server);
    let mut view = PostDetailView::new(app.gateway.clone(), "gone");
    view.load().await;
    assert!(matches!(view.state(), ViewState::NotFound));
    assert!(view.post().is_none());
}

#[tokio::test]
async fn error_field_on_success_status_is_still_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Not allowed"})))
        .mount(&server)
        .await;

    let app = app_for(&server);
    let err = app.gateway.appeal("please").await.unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 200);
            assert_eq!(message, "Not allowed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn toggles_post_the_action_and_target() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_partial_json(json!({"action": "unlike_post", "post_id": "p9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server);
    let mutation = Mutation::new(ToggleKind::LikePost, "p9", Polarity::Revert);
    let ack = app.gateway.dispatch(&mutation).await.unwrap();
    assert!(ack.ok);
}

#[tokio::test]
async fn photo_post_uploads_then_creates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_partial_json(json!({"type": "image/png", "folder": "posts", "file": "iVBORw=="})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn.example/p/1.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_partial_json(json!({
            "action": "create_post",
            "content": "sunset",
            "image_url": "https://cdn.example/p/1.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "id": "p10"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server);
    let file = MediaFile {
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
        mime_type: "image/png".to_string(),
    };
    let ack = app.media.publish_post(" sunset ", Some(&file)).await.unwrap().unwrap();
    assert_eq!(ack.id.as_deref(), Some("p10"));
}

#[tokio::test]
async fn logout_clears_even_when_the_server_fails() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .and(body_partial_json(json!({"action": "logout"})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let app = app_for(&server);
    app.auth.login("alice@example.com", "secret").await.unwrap();
    let mut signed_in = app.session.subscribe();
    assert!(*signed_in.borrow_and_update());

    app.auth.logout().await;
    assert!(!app.session.has_token());
    assert!(!*signed_in.borrow());
}

#[tokio::test]
async fn unreachable_auth_service_ends_the_stored_session() {
    // nothing listens on port 1
    let config = ClientConfig::from_lookup(|key| match key {
        "BUZZZY_AUTH_URL" => Some("http://127.0.0.1:1/auth".to_string()),
        _ => None,
    });
    let store = Arc::new(MemoryStore::with(TOKEN_KEY, "stale"));
    let app = ClientApp::from_config(config, store.clone()).unwrap();

    let err = app.auth.refresh().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(store.get(TOKEN_KEY).is_none());
    assert!(!app.session.has_token());
}

#[tokio::test]
async fn admin_queues_are_read_by_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_partial_json(json!({"action": "admin_get_reports"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "r1",
            "target_type": "post",
            "target_id": "p7",
            "reporter": "amy",
            "reason": "spam",
            "created_at": "2024-05-01 12:00:00"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server);
    let reports = app.gateway.admin_reports().await.unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].target_id.as_deref(), Some("p7"));
    assert!(reports[0].created_at.is_some());
}
