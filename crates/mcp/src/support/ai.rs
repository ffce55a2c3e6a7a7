#![forbid(unsafe_code)]

use serde_json::{Value, json};
use tl_storage::StoreError;

pub(crate) fn format_store_error(err: &StoreError) -> String {
    match err {
        StoreError::Io(e) => format!("IO: {e}"),
        StoreError::Record(e) => format!("Record: {e}"),
    }
}

pub(crate) fn ai_ok(intent: &str, result: Value) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "result": result,
        "error": null
    })
}

/// Success payload whose result is rendered markdown; the transport layer
/// passes the string through as raw text instead of a JSON envelope.
pub(crate) fn ai_markdown(intent: &str, rendered: String) -> Value {
    json!({
        "success": true,
        "intent": intent,
        "markdown": true,
        "result": rendered,
        "error": null
    })
}

pub(crate) fn ai_error(code: &str, message: &str) -> Value {
    json!({
        "success": false,
        "intent": "error",
        "result": {},
        "error": { "code": code, "message": message.trim() }
    })
}

pub(crate) fn store_unavailable(err: &StoreError) -> Value {
    ai_error("STORE_UNAVAILABLE", &format_store_error(err))
}
