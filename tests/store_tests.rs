// Integration tests for the PostgREST store client against a mock server

use consult_desk_lib::admin;
use consult_desk_lib::persistence::{
    ConsultationStore, NewMessage, NewStakeholder, PostgrestStore, StoreError,
};
use mockito::Matcher;
use serde_json::json;

const KEY: &str = "anon-key";

fn store(server: &mockito::ServerGuard) -> PostgrestStore {
    PostgrestStore::new(server.url(), KEY).unwrap()
}

#[tokio::test]
async fn test_insert_sends_auth_and_prefer_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/stakeholders")
        .match_header("apikey", KEY)
        .match_header("authorization", "Bearer anon-key")
        .match_header("prefer", "return=representation")
        .match_body(Matcher::PartialJson(json!([
            {"name": "Sam Lee", "department": "Nursing"}
        ])))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": 7, "name": "Sam Lee", "role": "Teacher", "department": "Nursing"}]"#)
        .create_async()
        .await;

    let stored = store(&server)
        .insert_stakeholder(&NewStakeholder {
            name: "Sam Lee".to_string(),
            role: "Teacher".to_string(),
            department: "Nursing".to_string(),
            email: None,
            created_at: "2026-10-19T09:00:00Z".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(stored.id, "7");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_batches_are_not_sent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let store = store(&server);
    store.insert_messages(&[]).await.unwrap();
    store.insert_priorities(&[]).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_insert_messages_in_one_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/conversation_messages")
        .match_body(Matcher::Regex(r#""sender":"ai".*"sender":"user""#.to_string()))
        .with_status(201)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let row = |sender: &str, text: &str| NewMessage {
        session_id: "s-1".to_string(),
        sender: sender.to_string(),
        message_text: text.to_string(),
        timestamp: "2026-10-19T09:00:00Z".to_string(),
        ai_insights: Vec::new(),
    };

    store(&server)
        .insert_messages(&[row("ai", "Welcome"), row("user", "Hello")])
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_session_missing_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            Matcher::Regex(r"^/rest/v1/consultation_sessions".to_string()),
        )
        .match_query(Matcher::UrlEncoded("id".to_string(), "eq.s-404".to_string()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let err = store(&server).get_session("s-404").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_store_error_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            Matcher::Regex(r"^/rest/v1/consultation_sessions".to_string()),
        )
        .with_status(401)
        .with_body(r#"{"message": "Invalid API key"}"#)
        .create_async()
        .await;

    match store(&server).list_sessions().await {
        Err(StoreError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_admin_listing_and_export() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock(
            "GET",
            Matcher::Regex(r"^/rest/v1/consultation_sessions".to_string()),
        )
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("order".to_string(), "started_at.desc".to_string()),
            Matcher::UrlEncoded(
                "select".to_string(),
                "*,stakeholders(name,role,department)".to_string(),
            ),
        ]))
        .with_status(200)
        .with_body(
            json!([
                {"id": 2, "consultation_type": "risk_register", "status": "completed",
                 "started_at": "2026-10-18T10:00:00Z",
                 "stakeholders": {"name": "Sam Lee", "role": "Teacher", "department": "Nursing"}},
                {"id": 1, "consultation_type": "capacity_assessment", "status": "active",
                 "started_at": "2026-09-02T10:00:00Z"}
            ])
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock(
            "GET",
            Matcher::Regex(r"^/rest/v1/consultation_sessions".to_string()),
        )
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".to_string(), "eq.2".to_string()),
            Matcher::UrlEncoded(
                "select".to_string(),
                "*,stakeholders(*),conversation_messages(*),priorities(*)".to_string(),
            ),
        ]))
        .with_status(200)
        .with_body(
            json!([{
                "id": 2,
                "consultation_type": "risk_register",
                "session_data": {"summary": {}},
                "stakeholders": {"id": 7, "name": "Sam Lee"},
                "conversation_messages": [{"sender": "user", "message_text": "Hi"}],
                "priorities": []
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let store = store(&server);

    let listing = admin::list_sessions(&store, "risk_register").await.unwrap();
    assert_eq!(listing.stats.total, 2);
    assert_eq!(listing.stats.completed, 1);
    assert_eq!(listing.sessions.len(), 1);
    assert_eq!(listing.sessions[0].id, "2");

    let file = admin::export_session(&store, "2").await.unwrap();
    assert_eq!(file.file_name, "consultation-2.json");
    let exported: serde_json::Value = serde_json::from_slice(&file.bytes).unwrap();
    assert_eq!(exported["session_data"]["summary"], json!({}));
    assert_eq!(exported["conversation_messages"][0]["message_text"], "Hi");
}
