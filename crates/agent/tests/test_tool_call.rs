//! Extractor behaviour on realistic model replies

use huddle_agent::{extract_tool_call, parse_literal, ParsedToolCall, ToolCallParse};
use huddle_platform::SENTINEL_TOOL;
use serde_json::json;

#[test]
fn test_sentinel_reply_round_trip() {
    let reply =
        "[xpfinish-agent-execution-finished{'bodyParams': {'result': 'ok', 'is_success': True}}]";

    match extract_tool_call(reply) {
        ToolCallParse::Call(ParsedToolCall { name, payload }) => {
            assert_eq!(name, SENTINEL_TOOL);
            assert_eq!(
                payload,
                json!({"bodyParams": {"result": "ok", "is_success": true}})
            );
        }
        other => panic!("Expected Call, got {:?}", other),
    }
}

#[test]
fn test_payload_matches_literal_regardless_of_prose() {
    let literal = "{'pathParams': {'calendarId': 'primary'}, 'queryParams': {'maxResults': 10, 'singleEvents': True, 'timeMin': None}}";
    let expected = parse_literal(literal).unwrap();

    let wrappings = [
        format!("[CalendarEventManagementGetCalendarEventsById{}]", literal),
        format!(
            "Sure, checking now.\n<TOOLCALL>[CalendarEventManagementGetCalendarEventsById{}]</TOOLCALL>",
            literal
        ),
        format!(
            "I'll look this up:\n\n[CalendarEventManagementGetCalendarEventsById{}]\n\nBack shortly.",
            literal
        ),
    ];

    for reply in &wrappings {
        let parsed = extract_tool_call(reply);
        assert_eq!(
            parsed,
            ToolCallParse::Call(ParsedToolCall {
                name: "CalendarEventManagementGetCalendarEventsById".to_string(),
                payload: expected.clone(),
            }),
            "reply: {}",
            reply
        );
    }
    assert_eq!(expected["queryParams"]["timeMin"], json!(null));
}

#[test]
fn test_replies_without_calls() {
    for reply in [
        "",
        "Your next meeting is at 3pm.",
        "Lists like [1, 2] are fine",
        "<TOOLCALL></TOOLCALL>",
    ] {
        assert_eq!(extract_tool_call(reply), ToolCallParse::NoCall, "{}", reply);
    }
}

#[test]
fn test_only_first_of_two_calls() {
    let reply = "<TOOLCALL>[MeetingRecordingBotCreateBot{'bodyParams': {'meeting_url': 'https://meet.example.com/abc'}}]</TOOLCALL>\n<TOOLCALL>[SendEmail{'bodyParams': {'to': 'a@example.com'}}]</TOOLCALL>";

    let parsed = extract_tool_call(reply);
    assert_eq!(parsed.tool_name(), Some("MeetingRecordingBotCreateBot"));
    match parsed {
        ToolCallParse::Call(call) => assert_eq!(
            call.payload["bodyParams"]["meeting_url"],
            "https://meet.example.com/abc"
        ),
        other => panic!("Expected Call, got {:?}", other),
    }
}

#[test]
fn test_malformed_is_not_no_call() {
    let parsed = extract_tool_call("[foo{not valid}]");
    assert!(matches!(parsed, ToolCallParse::Malformed { .. }));
    assert_ne!(parsed, ToolCallParse::NoCall);
    assert!(!parsed.is_call());
}

#[test]
fn test_double_quoted_and_json_style_payload() {
    let reply = r#"[SendEmail{"bodyParams": {"to": "bob@example.com", "subject": "Notes", "body": "Line one\nLine two"}}]"#;
    match extract_tool_call(reply) {
        ToolCallParse::Call(call) => {
            assert_eq!(call.name, "SendEmail");
            assert_eq!(call.payload["bodyParams"]["body"], "Line one\nLine two");
        }
        other => panic!("Expected Call, got {:?}", other),
    }
}
