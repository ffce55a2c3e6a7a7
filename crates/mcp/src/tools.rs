#![forbid(unsafe_code)]

use serde_json::{Value, json};

fn identity_properties() -> Value {
    json!({
        "user_id": {
            "type": "string",
            "description": "User whose task list to operate on. Defaults to 'default_user'."
        },
        "session_id": {
            "type": "string",
            "description": "Session within the user. Defaults to 'default_session'."
        }
    })
}

fn with_identity(mut extra: serde_json::Map<String, Value>, required: &[&str]) -> Value {
    let base = identity_properties();
    if let Some(obj) = base.as_object() {
        for (key, value) in obj {
            extra.insert(key.clone(), value.clone());
        }
    }
    json!({
        "type": "object",
        "properties": Value::Object(extra),
        "required": required
    })
}

fn props(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}

pub(crate) fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "add_task",
            "description": "Add a task to the list. Pass parent_task_id to nest it under an \
existing task; the result carries the new task's positional id (e.g. '1.3.2').",
            "inputSchema": with_identity(
                props(&[
                    ("description", json!({
                        "type": "string",
                        "description": "What the task is about."
                    })),
                    ("parent_task_id", json!({
                        "type": "string",
                        "description": "Dotted id of the task to nest under, e.g. '1.3'. Omit for a top-level task."
                    })),
                ]),
                &["description"],
            )
        }),
        json!({
            "name": "show_task_list",
            "description": "Render the task list as markdown. Each line carries the task's \
current positional id; ids shift when earlier siblings are deleted.",
            "inputSchema": with_identity(props(&[]), &[])
        }),
        json!({
            "name": "list_tasks",
            "description": "List tasks as structured entries (id, description, state), \
optionally filtered by state. Ids are always full-tree positions.",
            "inputSchema": with_identity(
                props(&[
                    ("state", json!({
                        "type": "string",
                        "enum": ["pending", "in_progress", "completed", "failed"],
                        "description": "Only return tasks in this state."
                    })),
                ]),
                &[],
            )
        }),
        json!({
            "name": "delete_task",
            "description": "Delete a task and its whole subtree. Later siblings are \
renumbered; re-read ids before further mutations.",
            "inputSchema": with_identity(
                props(&[
                    ("task_id", json!({
                        "type": "string",
                        "description": "Dotted id of the task to delete, e.g. '2.1'."
                    })),
                ]),
                &["task_id"],
            )
        }),
        json!({
            "name": "update_task_status",
            "description": "Set a task's state to pending, in_progress, completed, or failed.",
            "inputSchema": with_identity(
                props(&[
                    ("task_id", json!({
                        "type": "string",
                        "description": "Dotted id of the task to update."
                    })),
                    ("status", json!({
                        "type": "string",
                        "enum": ["pending", "in_progress", "completed", "failed"]
                    })),
                ]),
                &["task_id", "status"],
            )
        }),
        json!({
            "name": "clear_task_list",
            "description": "Delete the entire task list for an identity, including its durable record.",
            "inputSchema": with_identity(props(&[]), &[])
        }),
        json!({
            "name": "list_users",
            "description": "List users that have at least one stored task list.",
            "inputSchema": {
                "type": "object",
                "properties": {},
                "required": []
            }
        }),
        json!({
            "name": "list_sessions",
            "description": "List sessions with a stored task list for a user.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "User to enumerate. Defaults to 'default_user'."
                    }
                },
                "required": []
            }
        }),
    ]
}
