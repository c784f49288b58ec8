//! The workboard handler set end to end: reads, mutations and the cache
//! entries they invalidate.

mod common;

use std::sync::Arc;

use serde_json::json;

use workboard_mcp::{build_server, ProtocolHandler, ServerConfig, WorkspaceManager};

use common::*;

#[tokio::test]
async fn test_create_item_invalidates_its_board_listing_only() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server.clone()).await;
    let items = |id, board| {
        request(
            id,
            "resources/read",
            json!({"uri": "board_items", "arguments": {"board_id": board}}),
        )
    };

    let before = send_unwrap(&handler, items(1, 1)).await;
    assert_eq!(read_payload(&before)["count"], 3);
    send_unwrap(&handler, items(2, 2)).await;
    assert_eq!(send_unwrap(&handler, items(3, 1)).await["result"]["cached"], true);

    let resp = send_unwrap(
        &handler,
        request(
            4,
            "tools/call",
            json!({"name": "create_item", "arguments": {"board_id": 1, "item_name": "Book venue"}}),
        ),
    )
    .await;
    assert_eq!(resp["result"]["structuredContent"]["id"], 4);
    assert_eq!(resp["result"]["content"][0]["type"], "text");

    let after = send_unwrap(&handler, items(5, 1)).await;
    assert_eq!(after["result"]["cached"], false);
    assert_eq!(read_payload(&after)["count"], 4);

    let other = send_unwrap(&handler, items(6, 2)).await;
    assert_eq!(other["result"]["cached"], true);
}

#[tokio::test]
async fn test_board_listing_spellings_all_invalidated_by_create_item() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server.clone()).await;
    let items = |id, arguments| {
        request(
            id,
            "resources/read",
            json!({"uri": "board_items", "arguments": arguments}),
        )
    };

    let resp = send_unwrap(&handler, items(1, json!({"board_id": "1"}))).await;
    assert_eq!(error_kind(&resp), "HandlerError");
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .contains("'board_id' must be a non-negative integer"));
    assert!(server.cache().is_empty());

    let plain = json!({"board_id": 1});
    let extra = json!({"board_id": 1, "view": "compact"});
    assert_eq!(read_payload(&send_unwrap(&handler, items(2, plain.clone())).await)["count"], 3);
    assert_eq!(read_payload(&send_unwrap(&handler, items(3, extra.clone())).await)["count"], 3);
    assert_eq!(send_unwrap(&handler, items(4, extra.clone())).await["result"]["cached"], true);

    send_unwrap(
        &handler,
        request(
            5,
            "tools/call",
            json!({
                "name": "create_item",
                "arguments": {"board_id": 1, "item_name": "Print flyers"}
            }),
        ),
    )
    .await;

    for (id, arguments) in [(6, plain), (7, extra)] {
        let resp = send_unwrap(&handler, items(id, arguments)).await;
        assert_eq!(resp["result"]["cached"], false);
        assert_eq!(read_payload(&resp)["count"], 4);
    }
}

#[tokio::test]
async fn test_add_update_visible_through_item_updates() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server.clone()).await;
    let updates = |id, item| {
        request(
            id,
            "resources/read",
            json!({"uri": "item_updates", "arguments": {"item_id": item}}),
        )
    };

    assert_eq!(read_payload(&send_unwrap(&handler, updates(1, 1)).await)["count"], 0);
    send_unwrap(&handler, updates(2, 2)).await;

    let resp = send_unwrap(
        &handler,
        request(
            3,
            "tools/call",
            json!({
                "name": "add_update_to_item",
                "arguments": {"item_id": 1, "update_text": "Venue booked"}
            }),
        ),
    )
    .await;
    assert_eq!(resp["result"]["structuredContent"]["id"], 1);

    let after = send_unwrap(&handler, updates(4, 1)).await;
    assert_eq!(after["result"]["cached"], false);
    assert_eq!(read_payload(&after)["updates"][0]["body"], "Venue booked");
    assert_eq!(send_unwrap(&handler, updates(5, 2)).await["result"]["cached"], true);
}

#[tokio::test]
async fn test_failed_tool_call_keeps_cache() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server.clone()).await;
    let boards = |id| request(id, "resources/read", json!({"uri": "boards"}));

    send_unwrap(&handler, boards(1)).await;
    let resp = send_unwrap(
        &handler,
        request(
            2,
            "tools/call",
            json!({"name": "create_item", "arguments": {"board_id": 42, "item_name": "x"}}),
        ),
    )
    .await;
    assert_eq!(error_kind(&resp), "HandlerError");
    assert!(resp["error"]["message"].as_str().unwrap().contains("Board not found: 42"));
    assert_eq!(send_unwrap(&handler, boards(3)).await["result"]["cached"], true);
}

#[tokio::test]
async fn test_update_note_invalidates_note_and_listing() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server.clone()).await;
    let note = |id| {
        request(
            id,
            "resources/read",
            json!({"uri": "note", "arguments": {"note_id": "note-2"}}),
        )
    };

    send_unwrap(&handler, note(1)).await;
    send_unwrap(
        &handler,
        request(
            2,
            "tools/call",
            json!({
                "name": "update_note",
                "arguments": {"note_id": "note-2", "title": "Groceries"}
            }),
        ),
    )
    .await;
    let resp = send_unwrap(&handler, note(3)).await;
    assert_eq!(read_payload(&resp)["title"], "Groceries");
}

#[tokio::test]
async fn test_resource_missing_parameter_is_handler_error() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server).await;
    let resp = send_unwrap(
        &handler,
        request(1, "resources/read", json!({"uri": "board_structure"})),
    )
    .await;
    assert_eq!(error_kind(&resp), "HandlerError");
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing required parameter 'board_id'"));
}

#[tokio::test]
async fn test_assign_then_workload() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server).await;
    let workload = |id| {
        request(
            id,
            "resources/read",
            json!({"uri": "user_workload", "arguments": {"user_id": 101}}),
        )
    };

    assert_eq!(read_payload(&send_unwrap(&handler, workload(1)).await)["total"], 1);
    let resp = send_unwrap(
        &handler,
        request(
            2,
            "tools/call",
            json!({"name": "assign_user_to_item", "arguments": {"item_id": 1, "user_id": 101}}),
        ),
    )
    .await;
    assert!(resp.get("result").is_some(), "{resp}");
    assert_eq!(read_payload(&send_unwrap(&handler, workload(3)).await)["total"], 2);
}

#[tokio::test]
async fn test_prompts_are_returned_verbatim() {
    let (server, _ws) = workboard_server(ServerConfig::default());
    let handler = ready(server).await;

    let list = send_unwrap(&handler, request(1, "ListPrompts", json!({}))).await;
    let prompts = list["result"]["prompts"].as_array().unwrap();
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[0]["name"], "project_initiation");
    assert_eq!(prompts[0]["stepCount"], 3);

    let resp = send_unwrap(
        &handler,
        request(2, "ReadPrompt", json!({"promptId": "risk_management"})),
    )
    .await;
    let result = &resp["result"];
    assert_eq!(result["description"], "Identify and escalate tasks at risk");
    let steps = result["steps"].as_array().unwrap();
    assert_eq!(steps[1]["type"], "display");
    assert_eq!(steps[1]["computedContent"], "delayed_tasks");
    assert_eq!(steps[2]["fields"][1]["dynamicOptions"], "users");
    assert_eq!(steps[2]["fields"][2]["required"], true);
}

#[tokio::test]
async fn test_mutations_persist_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.json");
    let path = path.to_str().unwrap();

    {
        let workspace = WorkspaceManager::open(path).unwrap().into_shared();
        let server = Arc::new(build_server(ServerConfig::default(), &workspace).unwrap());
        let handler = ready(server).await;
        let resp = send_unwrap(
            &handler,
            request(
                1,
                "tools/call",
                json!({
                    "name": "create_note",
                    "arguments": {"title": "Retro", "content": "Went well", "tags": ["team"]}
                }),
            ),
        )
        .await;
        assert_eq!(resp["result"]["structuredContent"]["id"], "note-3");
        workspace.lock().await.save().unwrap();
    }

    let workspace = WorkspaceManager::open(path).unwrap().into_shared();
    let server = Arc::new(build_server(ServerConfig::default(), &workspace).unwrap());
    let handler = ProtocolHandler::new(server);
    send_unwrap(&handler, init_request()).await;
    let resp = send_unwrap(
        &handler,
        request(2, "tools/call", json!({"name": "search_notes", "arguments": {"tags": ["team"]}})),
    )
    .await;
    assert_eq!(resp["result"]["structuredContent"]["count"], 1);
}
