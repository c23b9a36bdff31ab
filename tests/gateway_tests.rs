// Integration tests for the HTTP agent gateway against a mock backend

use consult_desk_lib::gateway::{AgentGateway, AgentRequest, GatewayError, HttpAgentGateway};
use consult_desk_lib::models::{ConsultationTool, ConversationTurn, StakeholderInfo};
use mockito::Matcher;
use serde_json::json;

fn stakeholder() -> StakeholderInfo {
    StakeholderInfo {
        name: "Sam Lee".to_string(),
        role: "Head Teacher".to_string(),
        department: "Nursing".to_string(),
        email: Some("sam.lee@example.edu".to_string()),
    }
}

#[tokio::test]
async fn test_reply_is_decoded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/risk-agent")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "message": "Our placements are at risk",
            "session_id": "agent-1",
            "context": {
                "user_id": "sam.lee@example.edu",
                "department": "Nursing",
                "conversationHistory": [{"sender": "ai", "message": "Welcome"}]
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "message": "Tell me more about the placements.",
                "session_id": "agent-1",
                "data": {"conversation_stage": "risk_identification"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let gateway = HttpAgentGateway::new(server.url()).unwrap();
    let history = vec![ConversationTurn::assistant("Welcome")];
    let request = AgentRequest::new(
        ConsultationTool::Risk,
        "Our placements are at risk",
        &stakeholder(),
        &history,
        Some("agent-1".to_string()),
    );

    let reply = gateway.send(ConsultationTool::Risk, request).await.unwrap();
    assert_eq!(reply.message, "Tell me more about the placements.");
    assert_eq!(reply.session_id.as_deref(), Some("agent-1"));
    assert_eq!(reply.conversation_stage(), Some("risk_identification"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_configured_path_is_used() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/agents/riva")
        .with_status(200)
        .with_body(r#"{"message": "Hi"}"#)
        .create_async()
        .await;

    let gateway = HttpAgentGateway::new(server.url())
        .unwrap()
        .with_path(ConsultationTool::Delivery, "agents/riva");
    let request = AgentRequest::new(ConsultationTool::Delivery, "Hello", &stakeholder(), &[], None);

    let reply = gateway
        .send(ConsultationTool::Delivery, request)
        .await
        .unwrap();
    assert_eq!(reply.message, "Hi");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/run")
        .with_status(503)
        .with_body("agent offline")
        .create_async()
        .await;

    let gateway = HttpAgentGateway::new(server.url()).unwrap();
    let request = AgentRequest::new(ConsultationTool::Priority, "Hello", &stakeholder(), &[], None);

    match gateway.send(ConsultationTool::Priority, request).await {
        Err(GatewayError::Status { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "agent offline");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_body_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/capacity-agent")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let gateway = HttpAgentGateway::new(server.url()).unwrap();
    let request = AgentRequest::new(ConsultationTool::Capacity, "Hello", &stakeholder(), &[], None);

    let err = gateway
        .send(ConsultationTool::Capacity, request)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
}
