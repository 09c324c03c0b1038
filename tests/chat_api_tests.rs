use std::time::Duration;

use chatterbox::api::{ApiError, ConversationDirectory, Endpoints, HistorySource, HttpChatApi};
use chatterbox::core::message::Origin;
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn client_for(server: &MockServer) -> HttpChatApi {
    let endpoints = Endpoints::new(&server.uri(), None).unwrap();
    HttpChatApi::new(endpoints, Duration::from_secs(5)).unwrap()
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_history_with_flat_username() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/conversations/general/messages/",
        json!([
            {"id": "a1", "content": "hello", "username": "bob", "timestamp": "2024-01-01T09:30:00Z"},
            {"id": "a2", "content": "hi bob", "username": "ann", "timestamp": "2024-01-01T09:31:00Z"}
        ]),
    )
    .await;

    let messages = client_for(&server).fetch_history("general").await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, "a1");
    assert_eq!(messages[0].sender, "bob");
    assert_eq!(messages[0].content, "hello");
    assert_eq!(
        messages[0].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
    );
    assert_eq!(messages[1].sender, "ann");
    assert!(messages.iter().all(|m| m.origin == Origin::History));
}

#[tokio::test]
async fn test_history_with_nested_sender_and_numeric_id() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/conversations/general/messages/",
        json!([
            {
                "id": 42,
                "content": "nested",
                "sender": {"id": 7, "username": "carol", "email": "carol@example.com"},
                "timestamp": "2024-01-01T09:30:00.123456",
                "read": false
            }
        ]),
    )
    .await;

    let messages = client_for(&server).fetch_history("general").await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, "42");
    assert_eq!(messages[0].sender, "carol");
}

#[tokio::test]
async fn test_history_room_name_is_percent_encoded() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/conversations/team%20chat/messages/",
        json!([{"id": "1", "content": "spaced", "username": "bob"}]),
    )
    .await;

    let messages = client_for(&server).fetch_history("team chat").await.unwrap();
    assert_eq!(messages[0].content, "spaced");
}

#[tokio::test]
async fn test_history_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/general/messages/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database on fire"))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_history("general").await;

    match result {
        Err(ApiError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("database on fire"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_history_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/general/messages/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).fetch_history("general").await;
    assert!(matches!(result, Err(ApiError::Parse(_))));
}

#[tokio::test]
async fn test_history_unreachable_server() {
    // Bind then drop to get a port with nothing listening.
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let result = client.fetch_history("general").await;
    assert!(matches!(result, Err(ApiError::Network(_))));
}

// ============================================================================
// Directory
// ============================================================================

#[tokio::test]
async fn test_list_conversations() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/conversations/",
        json!([
            {
                "id": 1,
                "name": "general",
                "message_count": 12,
                "participants": [{"id": 1, "username": "bob"}, {"id": 2, "username": "ann"}],
                "last_message": {"id": 9, "content": "bye", "username": "bob"},
                "updated_at": "2024-01-02T10:00:00Z",
                "created_at": "2024-01-01T10:00:00Z"
            },
            {"name": "random"}
        ]),
    )
    .await;

    let conversations = client_for(&server).list_conversations().await.unwrap();

    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].name, "general");
    assert_eq!(conversations[0].message_count, 12);
    assert_eq!(conversations[0].participants.len(), 2);
    assert_eq!(
        conversations[0].last_message.as_ref().map(|m| m.content.as_str()),
        Some("bye")
    );
    assert_eq!(conversations[1].name, "random");
    assert_eq!(conversations[1].message_count, 0);
}

#[tokio::test]
async fn test_single_conversation_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let result = client_for(&server).conversation("missing").await;
    assert!(matches!(result, Err(ApiError::Api { status: 404, .. })));
}

#[tokio::test]
async fn test_dashboard_stats_with_null_users() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/dashboard/stats/",
        json!({
            "total_conversations": 0,
            "total_messages": 0,
            "total_users": null,
            "recent_conversations": []
        }),
    )
    .await;

    let stats = client_for(&server).dashboard_stats().await.unwrap();

    assert_eq!(stats.total_conversations, 0);
    assert_eq!(stats.total_users, None);
    assert!(stats.recent_conversations.is_empty());
}
