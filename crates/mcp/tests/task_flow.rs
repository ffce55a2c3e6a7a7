#![forbid(unsafe_code)]

mod support;

use serde_json::json;
use support::{Server, assert_tool_error, extract_tool_text_str, temp_dir, tool_result};

fn added_id(server: &mut Server, args: serde_json::Value) -> String {
    let resp = server.call_tool("add_task", args);
    tool_result(&resp)
        .get("task_id")
        .and_then(|v| v.as_str())
        .expect("task_id")
        .to_string()
}

#[test]
fn identifiers_shift_when_an_earlier_sibling_is_deleted() {
    let mut server = Server::start_initialized("identifiers_shift_when_an_earlier_sibling_is_deleted");

    assert_eq!(added_id(&mut server, json!({ "description": "Task 1" })), "1");
    assert_eq!(added_id(&mut server, json!({ "description": "Task 2" })), "2");
    assert_eq!(
        added_id(
            &mut server,
            json!({ "description": "Subtask", "parent_task_id": "1" })
        ),
        "1.1"
    );

    let resp = server.call_tool(
        "update_task_status",
        json!({ "task_id": "2", "status": "completed" }),
    );
    assert_eq!(tool_result(&resp).get("updated"), Some(&json!(true)));

    let resp = server.call_tool("delete_task", json!({ "task_id": "1" }));
    assert_eq!(tool_result(&resp).get("deleted"), Some(&json!(true)));

    // The former "2" now renders as "1", keeping its completed state.
    let resp = server.call_tool("show_task_list", json!({}));
    assert_eq!(
        extract_tool_text_str(&resp),
        "# Task List\n- [x] 1: Task 2\n"
    );
}

#[test]
fn markdown_nests_subtasks_under_their_parents() {
    let mut server = Server::start_initialized("markdown_nests_subtasks_under_their_parents");

    added_id(&mut server, json!({ "description": "Plan" }));
    added_id(&mut server, json!({ "description": "Draft", "parent_task_id": "1" }));
    added_id(
        &mut server,
        json!({ "description": "Review", "parent_task_id": "1.1" }),
    );

    let resp = server.call_tool("show_task_list", json!({}));
    assert_eq!(
        extract_tool_text_str(&resp),
        "# Task List\n- [ ] 1: Plan\n  - [ ] 1.1: Draft\n    - [ ] 1.1.1: Review\n"
    );
}

#[test]
fn empty_list_renders_just_the_header() {
    let mut server = Server::start_initialized("empty_list_renders_just_the_header");
    let resp = server.call_tool("show_task_list", json!({}));
    assert_eq!(extract_tool_text_str(&resp), "# Task List\n");
}

#[test]
fn adding_under_a_missing_parent_reports_parent_not_found() {
    let mut server = Server::start_initialized("adding_under_a_missing_parent_reports_parent_not_found");

    let resp = server.call_tool(
        "add_task",
        json!({ "description": "Orphan", "parent_task_id": "7.3" }),
    );
    assert_tool_error(&resp, "PARENT_NOT_FOUND");

    // A malformed parent id addresses no task and reports the same way.
    let resp = server.call_tool(
        "add_task",
        json!({ "description": "Orphan", "parent_task_id": "not.a.path" }),
    );
    assert_tool_error(&resp, "PARENT_NOT_FOUND");
}

#[test]
fn unknown_state_is_rejected_before_touching_the_tree() {
    let mut server = Server::start_initialized("unknown_state_is_rejected_before_touching_the_tree");
    added_id(&mut server, json!({ "description": "Task 1" }));

    let resp = server.call_tool(
        "update_task_status",
        json!({ "task_id": "1", "status": "done" }),
    );
    assert_tool_error(&resp, "INVALID_STATE");

    let resp = server.call_tool("list_tasks", json!({ "state": "done" }));
    assert_tool_error(&resp, "INVALID_STATE");
}

#[test]
fn updating_a_missing_task_reports_updated_false() {
    let mut server = Server::start_initialized("updating_a_missing_task_reports_updated_false");

    let resp = server.call_tool(
        "update_task_status",
        json!({ "task_id": "4.2", "status": "completed" }),
    );
    assert_eq!(tool_result(&resp).get("updated"), Some(&json!(false)));

    let resp = server.call_tool("delete_task", json!({ "task_id": "9" }));
    assert_eq!(tool_result(&resp).get("deleted"), Some(&json!(false)));
}

#[test]
fn list_tasks_filters_by_state_with_full_tree_ids() {
    let mut server = Server::start_initialized("list_tasks_filters_by_state_with_full_tree_ids");

    added_id(&mut server, json!({ "description": "A" }));
    added_id(&mut server, json!({ "description": "B" }));
    added_id(&mut server, json!({ "description": "B1", "parent_task_id": "2" }));
    let _ = server.call_tool(
        "update_task_status",
        json!({ "task_id": "2.1", "status": "completed" }),
    );

    let resp = server.call_tool("list_tasks", json!({ "state": "completed" }));
    let tasks = tool_result(&resp)
        .get("tasks")
        .cloned()
        .expect("tasks array");
    // The filtered-out parent "2" does not hide its matching child, and
    // the child keeps its full-tree id.
    assert_eq!(
        tasks,
        json!([{ "id": "2.1", "description": "B1", "state": "completed" }])
    );

    let resp = server.call_tool("list_tasks", json!({}));
    let tasks = tool_result(&resp)
        .get("tasks")
        .and_then(|v| v.as_array())
        .map(|v| v.len())
        .expect("tasks array");
    assert_eq!(tasks, 3);
}

#[test]
fn identities_keep_separate_task_lists() {
    let mut server = Server::start_initialized("identities_keep_separate_task_lists");

    added_id(
        &mut server,
        json!({ "description": "Alpha work", "user_id": "alpha" }),
    );
    added_id(
        &mut server,
        json!({ "description": "Beta work", "user_id": "beta", "session_id": "sprint-1" }),
    );

    let resp = server.call_tool("show_task_list", json!({ "user_id": "alpha" }));
    assert_eq!(
        extract_tool_text_str(&resp),
        "# Task List\n- [ ] 1: Alpha work\n"
    );
    let resp = server.call_tool(
        "show_task_list",
        json!({ "user_id": "beta", "session_id": "sprint-1" }),
    );
    assert_eq!(
        extract_tool_text_str(&resp),
        "# Task List\n- [ ] 1: Beta work\n"
    );
    // The default identity saw none of it.
    let resp = server.call_tool("show_task_list", json!({}));
    assert_eq!(extract_tool_text_str(&resp), "# Task List\n");
}

#[test]
fn invalid_identity_is_rejected() {
    let mut server = Server::start_initialized("invalid_identity_is_rejected");
    let resp = server.call_tool(
        "add_task",
        json!({ "description": "X", "user_id": "a/b" }),
    );
    assert_tool_error(&resp, "INVALID_IDENTITY");
}

#[test]
fn task_lists_survive_a_server_restart() {
    let storage_dir = temp_dir("task_lists_survive_a_server_restart");

    {
        let mut server = Server::start_with_storage_dir(storage_dir.clone(), false);
        server.initialize_default();
        added_id(&mut server, json!({ "description": "Persist me" }));
        let _ = server.call_tool(
            "update_task_status",
            json!({ "task_id": "1", "status": "in_progress" }),
        );
    }

    let mut server = Server::start_with_storage_dir(storage_dir.clone(), true);
    server.initialize_default();
    let resp = server.call_tool("list_tasks", json!({}));
    assert_eq!(
        tool_result(&resp).get("tasks"),
        Some(&json!([{ "id": "1", "description": "Persist me", "state": "in_progress" }]))
    );
}

#[test]
fn unreadable_record_surfaces_store_unavailable() {
    let storage_dir = temp_dir("unreadable_record_surfaces_store_unavailable");

    {
        let mut server = Server::start_with_storage_dir(storage_dir.clone(), false);
        server.initialize_default();
        added_id(&mut server, json!({ "description": "soon corrupt" }));
    }

    let record = storage_dir
        .join("default_user")
        .join("default_session")
        .join("tasks.json");
    std::fs::write(&record, "{ not json").expect("corrupt record");

    let mut server = Server::start_with_storage_dir(storage_dir, true);
    server.initialize_default();
    let resp = server.call_tool("show_task_list", json!({}));
    assert_tool_error(&resp, "STORE_UNAVAILABLE");

    // A mutation against the same identity fails the same way instead of
    // replacing the record.
    let resp = server.call_tool("add_task", json!({ "description": "x" }));
    assert_tool_error(&resp, "STORE_UNAVAILABLE");
    assert_eq!(
        std::fs::read_to_string(&record).expect("record intact"),
        "{ not json"
    );
}

#[test]
fn clear_task_list_removes_the_durable_record() {
    let mut server = Server::start_initialized("clear_task_list_removes_the_durable_record");

    added_id(&mut server, json!({ "description": "Ephemeral" }));
    let resp = server.call_tool("clear_task_list", json!({}));
    assert_eq!(tool_result(&resp).get("cleared"), Some(&json!(true)));

    let resp = server.call_tool("show_task_list", json!({}));
    assert_eq!(extract_tool_text_str(&resp), "# Task List\n");

    // Clearing an already-empty identity is a normal no-op.
    let resp = server.call_tool("clear_task_list", json!({}));
    assert_eq!(tool_result(&resp).get("cleared"), Some(&json!(false)));
}

#[test]
fn enumeration_reports_stored_identities() {
    let mut server = Server::start_initialized("enumeration_reports_stored_identities");

    added_id(&mut server, json!({ "description": "A", "user_id": "alice" }));
    added_id(
        &mut server,
        json!({ "description": "B", "user_id": "alice", "session_id": "sprint-2" }),
    );
    added_id(&mut server, json!({ "description": "C", "user_id": "bob" }));

    let resp = server.call_tool("list_users", json!({}));
    assert_eq!(
        tool_result(&resp).get("users"),
        Some(&json!(["alice", "bob"]))
    );

    let resp = server.call_tool("list_sessions", json!({ "user_id": "alice" }));
    let result = tool_result(&resp);
    assert_eq!(result.get("user_id"), Some(&json!("alice")));
    assert_eq!(
        result.get("sessions"),
        Some(&json!(["default_session", "sprint-2"]))
    );
}

#[test]
fn missing_description_is_an_input_error() {
    let mut server = Server::start_initialized("missing_description_is_an_input_error");

    let resp = server.call_tool("add_task", json!({}));
    assert_tool_error(&resp, "INVALID_INPUT");

    let resp = server.call_tool("add_task", json!({ "description": "   " }));
    assert_tool_error(&resp, "INVALID_INPUT");
}
