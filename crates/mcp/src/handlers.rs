#![forbid(unsafe_code)]

use crate::{Identity, McpServer, TaskPath, TaskState};
use serde_json::{Value, json};
use tl_core::ids::{SessionId, UserId};
use tl_core::{AddTaskError, render_markdown};

pub(crate) fn dispatch_tool(server: &mut McpServer, name: &str, args: Value) -> Option<Value> {
    Some(match name {
        "add_task" => add_task(server, &args),
        "show_task_list" => show_task_list(server, &args),
        "list_tasks" => list_tasks(server, &args),
        "delete_task" => delete_task(server, &args),
        "update_task_status" => update_task_status(server, &args),
        "clear_task_list" => clear_task_list(server, &args),
        "list_users" => list_users(server),
        "list_sessions" => list_sessions(server, &args),
        _ => return None,
    })
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// Resolves the (user, session) pair the request operates on. Absent
/// arguments fall back to the shared default identity; present ones must
/// validate, since they become path components of the durable record.
fn identity_from_args(args: &Value) -> Result<Identity, Value> {
    let user = match opt_str(args, "user_id") {
        Some(raw) => UserId::try_new(raw)
            .map_err(|err| crate::ai_error("INVALID_IDENTITY", &format!("user_id: {err}")))?,
        None => Identity::default().user,
    };
    let session = match opt_str(args, "session_id") {
        Some(raw) => SessionId::try_new(raw)
            .map_err(|err| crate::ai_error("INVALID_IDENTITY", &format!("session_id: {err}")))?,
        None => Identity::default().session,
    };
    Ok(Identity::new(user, session))
}

fn add_task(server: &mut McpServer, args: &Value) -> Value {
    let identity = match identity_from_args(args) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };
    let Some(description) = opt_str(args, "description") else {
        return crate::ai_error("INVALID_INPUT", "description is required");
    };

    let parent = match opt_str(args, "parent_task_id") {
        Some(raw) => match TaskPath::parse(raw) {
            Ok(path) => Some(path),
            // A parent id that cannot even be parsed addresses no task;
            // callers see the same outcome as a well-formed miss.
            Err(_) => return parent_not_found(raw),
        },
        None => None,
    };
    let parent_raw = opt_str(args, "parent_task_id").map(str::to_string);

    let outcome = server
        .cache()
        .mutate(&identity, |tree| tree.add_task(parent.as_ref(), description));
    match outcome {
        Ok(Ok(path)) => crate::ai_ok("add_task", json!({ "task_id": path.to_string() })),
        Ok(Err(AddTaskError::ParentNotFound)) => {
            parent_not_found(parent_raw.as_deref().unwrap_or(""))
        }
        Ok(Err(AddTaskError::EmptyDescription)) => {
            crate::ai_error("INVALID_INPUT", "description must not be empty")
        }
        Err(err) => crate::store_unavailable(&err),
    }
}

fn parent_not_found(raw: &str) -> Value {
    crate::ai_error(
        "PARENT_NOT_FOUND",
        &format!("Parent task with ID '{raw}' not found."),
    )
}

fn show_task_list(server: &mut McpServer, args: &Value) -> Value {
    let identity = match identity_from_args(args) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };
    match server.cache().read(&identity, render_markdown) {
        Ok(rendered) => crate::ai_markdown("show_task_list", rendered),
        Err(err) => crate::store_unavailable(&err),
    }
}

fn list_tasks(server: &mut McpServer, args: &Value) -> Value {
    let identity = match identity_from_args(args) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };
    let filter = match opt_str(args, "state") {
        Some(raw) => match TaskState::from_str(raw) {
            Some(state) => Some(state),
            None => return invalid_state(raw),
        },
        None => None,
    };

    let listed = server.cache().read(&identity, |tree| {
        tree.list(filter)
            .into_iter()
            .map(|(path, node)| {
                json!({
                    "id": path.to_string(),
                    "description": node.description,
                    "state": node.state.as_str()
                })
            })
            .collect::<Vec<_>>()
    });
    match listed {
        Ok(tasks) => crate::ai_ok("list_tasks", json!({ "tasks": tasks })),
        Err(err) => crate::store_unavailable(&err),
    }
}

fn invalid_state(raw: &str) -> Value {
    crate::ai_error(
        "INVALID_STATE",
        &format!("Invalid state '{raw}'. Expected one of: pending, in_progress, completed, failed."),
    )
}

fn delete_task(server: &mut McpServer, args: &Value) -> Value {
    let identity = match identity_from_args(args) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };
    let Some(raw) = opt_str(args, "task_id") else {
        return crate::ai_error("INVALID_INPUT", "task_id is required");
    };
    // A malformed id addresses no task, so it reports the same
    // not-found outcome as a well-formed miss.
    let Ok(path) = TaskPath::parse(raw) else {
        return crate::ai_ok("delete_task", json!({ "deleted": false }));
    };

    match server.cache().mutate(&identity, |tree| tree.delete(&path)) {
        Ok(deleted) => crate::ai_ok("delete_task", json!({ "deleted": deleted })),
        Err(err) => crate::store_unavailable(&err),
    }
}

fn update_task_status(server: &mut McpServer, args: &Value) -> Value {
    let identity = match identity_from_args(args) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };
    let Some(raw_state) = opt_str(args, "status") else {
        return crate::ai_error("INVALID_INPUT", "status is required");
    };
    let Some(state) = TaskState::from_str(raw_state) else {
        return invalid_state(raw_state);
    };
    let Some(raw_id) = opt_str(args, "task_id") else {
        return crate::ai_error("INVALID_INPUT", "task_id is required");
    };
    let Ok(path) = TaskPath::parse(raw_id) else {
        return crate::ai_ok("update_task_status", json!({ "updated": false }));
    };

    let outcome = server
        .cache()
        .mutate(&identity, |tree| tree.update_state(&path, state));
    match outcome {
        Ok(updated) => crate::ai_ok("update_task_status", json!({ "updated": updated })),
        Err(err) => crate::store_unavailable(&err),
    }
}

fn clear_task_list(server: &mut McpServer, args: &Value) -> Value {
    let identity = match identity_from_args(args) {
        Ok(identity) => identity,
        Err(resp) => return resp,
    };
    // Drop the live entry first so no request can write the old tree back
    // after the record is gone.
    server.cache().evict(&identity);
    match server.cache().store().delete(&identity) {
        Ok(cleared) => crate::ai_ok("clear_task_list", json!({ "cleared": cleared })),
        Err(err) => crate::store_unavailable(&err),
    }
}

fn list_users(server: &mut McpServer) -> Value {
    match server.cache().store().list_users() {
        Ok(users) => crate::ai_ok("list_users", json!({ "users": users })),
        Err(err) => crate::store_unavailable(&err),
    }
}

fn list_sessions(server: &mut McpServer, args: &Value) -> Value {
    let user = match opt_str(args, "user_id") {
        Some(raw) => match UserId::try_new(raw) {
            Ok(user) => user,
            Err(err) => return crate::ai_error("INVALID_IDENTITY", &format!("user_id: {err}")),
        },
        None => Identity::default().user,
    };
    match server.cache().store().list_sessions(&user) {
        Ok(sessions) => crate::ai_ok(
            "list_sessions",
            json!({ "user_id": user.as_str(), "sessions": sessions }),
        ),
        Err(err) => crate::store_unavailable(&err),
    }
}
