//! HTTP client tests against a mocked REST server
//!
//! These tests use wiremock to stand in for the chat API and validate:
//! - Bearer token handling
//! - Error message extraction
//! - Response shapes (untagged chats, creation envelope)
//! - Cloudinary uploads

use parlor::api::{ChatApi, HttpApiClient};
use parlor::types::{AppError, CreateGroupChatRequest, ProfileUpdate};
use parlor::upload::{CloudinaryUploader, ImageUploader};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= Helper Functions =============

fn user_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "username": name.to_lowercase(),
        "email": format!("{}@example.com", name.to_lowercase()),
        "roles": ["user"],
        "createdAt": "2024-01-01T00:00:00Z"
    })
}

fn message_json(id: &str, chat_id: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "senderId": "u1",
        "senderName": "Ada",
        "content": content,
        "timestamp": "2024-01-01T12:00:00Z",
        "chatId": chat_id
    })
}

async fn client(server: &MockServer) -> HttpApiClient {
    HttpApiClient::new(format!("{}/api", server.uri())).unwrap()
}

// ============= Auth =============

#[tokio::test]
async fn test_login_stores_token_for_later_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "identifier": "ada", "password": "hunter22" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": user_json("u1", "Ada"),
            "token": "secret-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("u1", "Ada")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let auth = client.login("ada", "hunter22").await.unwrap();
    assert_eq!(auth.user.id, "u1");
    assert_eq!(client.token().as_deref(), Some("secret-token"));

    let me = client.current_user().await.unwrap();
    assert_eq!(me.username, "ada");
}

#[tokio::test]
async fn test_login_failure_prefixes_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .login("ada", "wrong")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        AppError::Api {
            status: 401,
            message: "Login failed: Invalid credentials".to_string()
        }
    );
}

#[tokio::test]
async fn test_login_failure_without_body_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .login("ada", "hunter22")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Login failed");
}

#[tokio::test]
async fn test_register_failure_uses_server_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Username taken" })),
        )
        .mount(&server)
        .await;

    let request = parlor::types::RegisterRequest {
        name: "Ada".to_string(),
        username: "ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "hunter22".to_string(),
    };
    let err = client(&server).await.register(&request).await.unwrap_err();
    assert_eq!(err.user_message(), "Username taken");
}

#[tokio::test]
async fn test_current_user_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).await.current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message(), "Failed to get current user");
}

#[tokio::test]
async fn test_logout_clears_token_even_on_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server)
        .await
        .with_token(Some("stale".to_string()));
    assert!(client.logout().await.is_err());
    assert!(client.token().is_none());
}

#[tokio::test]
async fn test_network_error_when_server_is_down() {
    let client = HttpApiClient::new("http://127.0.0.1:9/api").unwrap();
    let err = client.get_chats().await.unwrap_err();
    assert!(matches!(err, AppError::Network(_)));
}

// ============= Chats =============

#[tokio::test]
async fn test_get_chats_accepts_untagged_shapes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "a",
                "participantId": "u2",
                "participantName": "Grace",
                "unreadCount": 2,
                "createdAt": "2024-01-01T00:00:00Z"
            },
            {
                "id": "g",
                "name": "Team",
                "members": [user_json("u1", "Ada")],
                "admin": "u1",
                "lastMessage": message_json("m1", "g", "hello"),
                "createdAt": "2024-01-01T00:00:00Z"
            }
        ])))
        .mount(&server)
        .await;

    let chats = client(&server).await.get_chats().await.unwrap();
    assert_eq!(chats.len(), 2);
    assert!(!chats[0].is_group());
    assert_eq!(chats[0].display_name(), "Grace");
    assert_eq!(chats[0].unread_count(), 2);
    assert!(chats[1].is_group());
    assert_eq!(chats[1].last_message().map(|m| m.content.as_str()), Some("hello"));
}

#[tokio::test]
async fn test_send_message_posts_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chats/a/messages"))
        .and(body_json(json!({ "content": "yo" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(message_json("m2", "a", "yo")))
        .expect(1)
        .mount(&server)
        .await;

    let sent = client(&server).await.send_message("a", "yo").await.unwrap();
    assert_eq!(sent.id, "m2");
    assert_eq!(sent.chat_id, "a");
}

#[tokio::test]
async fn test_create_group_chat_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chats/group"))
        .and(body_json(json!({ "name": "Team", "memberIds": ["u1", "u2"] })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "chat": {
                "id": "g-1",
                "name": "Team",
                "admin": "u1",
                "createdAt": "2024-01-01T00:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let request = CreateGroupChatRequest {
        name: "Team".to_string(),
        member_ids: vec!["u1".to_string(), "u2".to_string()],
        description: None,
    };
    let chat = client(&server)
        .await
        .create_group_chat(&request)
        .await
        .unwrap();
    assert_eq!(chat.id(), "g-1");
    assert!(chat.is_group());
}

#[tokio::test]
async fn test_create_private_chat_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chats/private"))
        .and(body_json(json!({ "participantId": "u2" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "chat": {
                "id": "c-1",
                "participantId": "u2",
                "participantName": "Grace",
                "createdAt": "2024-01-01T00:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let chat = client(&server)
        .await
        .create_private_chat("u2")
        .await
        .unwrap();
    assert_eq!(chat.display_name(), "Grace");
}

#[tokio::test]
async fn test_delete_chat_failure_message() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/chats/a"))
        .respond_with(ResponseTemplate::new(403).set_body_string("nope"))
        .mount(&server)
        .await;

    let err = client(&server).await.delete_chat("a").await.unwrap_err();
    assert_eq!(
        err,
        AppError::Api {
            status: 403,
            message: "Failed to delete chat".to_string()
        }
    );
}

// ============= Users =============

#[tokio::test]
async fn test_search_users_sends_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/search"))
        .and(query_param("q", "gr ace"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_json("u2", "Grace")])),
        )
        .mount(&server)
        .await;

    let users = client(&server).await.search_users("gr ace").await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Grace");
}

#[tokio::test]
async fn test_update_user_sends_only_changed_fields() {
    let server = MockServer::start().await;

    let mut updated = user_json("u1", "Ada King");
    updated["avatar"] = json!("https://cdn/ada.png");
    Mock::given(method("PATCH"))
        .and(path("/api/users/me"))
        .and(body_json(json!({ "name": "Ada King" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .mount(&server)
        .await;

    let user = client(&server)
        .await
        .update_user(&ProfileUpdate {
            name: Some("Ada King".to_string()),
            avatar: None,
        })
        .await
        .unwrap();
    assert_eq!(user.name, "Ada King");
    assert_eq!(user.avatar.as_deref(), Some("https://cdn/ada.png"));
}

#[tokio::test]
async fn test_get_user_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/u2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("u2", "Grace")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client(&server).await;
    assert_eq!(client.get_user("u2").await.unwrap().name, "Grace");

    let err = client.get_user("missing").await.unwrap_err();
    assert_eq!(
        err,
        AppError::Api {
            status: 404,
            message: "Failed to fetch user".to_string()
        }
    );
}

// ============= Uploads =============

#[tokio::test]
async fn test_cloudinary_upload_returns_secure_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1_1/demo/image/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "secure_url": "https://res.cloudinary.com/demo/ada.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uploader = CloudinaryUploader::new("demo", "unsigned", 1024)
        .with_endpoint(format!("{}/v1_1/demo/image/upload", server.uri()));
    let url = uploader
        .upload_image(vec![0x89, 0x50, 0x4e, 0x47], "ada.png")
        .await
        .unwrap();
    assert_eq!(url, "https://res.cloudinary.com/demo/ada.png");
}

#[tokio::test]
async fn test_cloudinary_rejection_surfaces_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Upload preset not found" }
        })))
        .mount(&server)
        .await;

    let uploader = CloudinaryUploader::new("demo", "missing", 1024)
        .with_endpoint(format!("{}/upload", server.uri()));
    let err = uploader.upload_image(vec![1, 2, 3], "a.png").await.unwrap_err();
    assert_eq!(err, AppError::Upload("Upload preset not found".to_string()));
}

#[tokio::test]
async fn test_cloudinary_rejects_oversized_file_before_sending() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uploader =
        CloudinaryUploader::new("demo", "unsigned", 4).with_endpoint(server.uri());
    let err = uploader.upload_image(vec![0; 5], "big.png").await.unwrap_err();
    assert!(matches!(err, AppError::Upload(_)));
}
