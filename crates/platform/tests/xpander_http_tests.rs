//! HTTP-level tests for the platform client against a mock server

use huddle_platform::{
    AgentPlatform, ExecutionStatus, PlatformError, RemoteInterface, ToolInvocation, XpanderClient,
    SENTINEL_TOOL,
};
use mockito::Matcher;
use serde_json::json;

async fn client(server: &mockito::ServerGuard) -> XpanderClient {
    XpanderClient::new("xp-test", Some(server.url()))
}

#[tokio::test]
async fn test_list_agents_sends_api_key() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/agents")
        .match_header("x-api-key", "xp-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id": "a1", "name": "Meeting Assistant", "tools": []}]"#)
        .create_async()
        .await;

    let agents = client(&server).await.list_agents().await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].id, "a1");
    assert_eq!(agents[0].name, "Meeting Assistant");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_operations_uses_interface_id() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/agents/a1/interfaces/cal-1/operations")
        .with_status(200)
        .with_body(
            r#"{"operations": [{"id_to_use_on_graph": "CalendarEventManagementGetCalendarEventsById", "name": "Get events"}]}"#,
        )
        .create_async()
        .await;

    let iface = RemoteInterface {
        id: "cal-1".to_string(),
        name: "Google Calendar".to_string(),
        raw: json!({}),
    };
    let ops = client(&server)
        .await
        .list_operations("a1", &iface)
        .await
        .unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(
        ops[0].internal_identifier,
        "CalendarEventManagementGetCalendarEventsById"
    );
    assert_eq!(ops[0].interface_id, "cal-1");
}

#[tokio::test]
async fn test_add_task_includes_thread_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/agents/a1/executions")
        .match_body(Matcher::PartialJson(json!({
            "input": {"text": "What meetings do I have?"},
            "memory_thread_id": "thread-9"
        })))
        .with_status(200)
        .with_body(r#"{"id": "exec-1", "memory_thread_id": "thread-9", "status": "pending"}"#)
        .create_async()
        .await;

    let handle = client(&server)
        .await
        .add_task("a1", "What meetings do I have?", Some("thread-9"))
        .await
        .unwrap();
    assert_eq!(handle.execution_id, "exec-1");
    assert_eq!(handle.thread_id, "thread-9");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_run_tools_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/agents/a1/executions/exec-1/tools")
        .with_status(200)
        .with_body(
            r#"[{"function_name": "xpfinish-agent-execution-finished", "status_code": 200, "is_success": true, "result": "ok"}]"#,
        )
        .create_async()
        .await;

    let invocation = ToolInvocation::new(
        SENTINEL_TOOL,
        json!({"bodyParams": {"result": "ok", "is_success": true}}),
    );
    let results = client(&server)
        .await
        .run_tools("a1", "exec-1", &[invocation])
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_sentinel());
    assert_eq!(results[0].status_code, 200);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_execution_result() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/agents/a1/executions/exec-1")
        .with_status(200)
        .with_body(r#"{"status": "completed", "result": "ok", "memory_thread_id": "thread-9"}"#)
        .create_async()
        .await;

    let result = client(&server)
        .await
        .get_execution_result("a1", "exec-1")
        .await
        .unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(result.result, "ok");
    assert_eq!(result.thread_id, "thread-9");
}

#[tokio::test]
async fn test_not_found_and_api_errors() {
    let mut server = mockito::Server::new_async().await;
    let _missing = server
        .mock("GET", "/agents/nope")
        .with_status(404)
        .with_body(r#"{"message": "agent nope not found"}"#)
        .create_async()
        .await;
    let _denied = server
        .mock("POST", "/agents/a1/sync")
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;

    let platform = client(&server).await;
    match platform.get_agent("nope").await {
        Err(PlatformError::NotFound(msg)) => assert_eq!(msg, "agent nope not found"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
    match platform.sync_agent("a1").await {
        Err(PlatformError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_attach_operations_posts_identifiers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/agents/a1/operations")
        .match_body(Matcher::Json(json!({"operations": ["GetEvents", "SendEmail"]})))
        .with_status(204)
        .create_async()
        .await;

    let ops: Vec<_> = ["GetEvents", "SendEmail"]
        .iter()
        .map(|id| huddle_platform::RemoteOperation {
            internal_identifier: id.to_string(),
            name: id.to_string(),
            interface_id: "i".to_string(),
            raw: json!({}),
        })
        .collect();
    client(&server)
        .await
        .attach_operations("a1", &ops)
        .await
        .unwrap();
    mock.assert_async().await;
}
