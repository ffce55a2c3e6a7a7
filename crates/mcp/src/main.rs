#![forbid(unsafe_code)]

mod entry;
mod handlers;
mod server;
mod support;
mod tools;

pub(crate) use support::*;

pub(crate) use tl_core::ids::Identity;
pub(crate) use tl_core::{TaskPath, TaskState};
use tl_storage::{FileStore, TreeCache};

use std::fmt::Write as _;

// Protocol negotiation:
// Some MCP clients are strict about the server echoing a compatible protocol version.
// We keep this at the widely deployed baseline and remain forward-compatible in behavior.
const MCP_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "tasklist-mcp";
const SERVER_VERSION: &str = "0.1.0";

const SERVER_INSTRUCTIONS: &str = "Hierarchical per-user task lists. Tasks are addressed by \
positional dotted identifiers ('1', '1.3', '1.3.2') that reflect the current tree shape; \
deleting a task renumbers later siblings, so re-read identifiers from show_task_list before \
mutating. All tools accept optional user_id/session_id to select a task list.";

fn write_last_crash(storage_dir: &std::path::Path, kind: &str, detail: &str) {
    // Best-effort crash report to help debug MCP transport issues without logging request bodies.
    let _ = std::fs::create_dir_all(storage_dir);
    let path = storage_dir.join("tasklist_mcp_last_crash.txt");

    let mut out = String::new();
    let ts_ms = crate::support::now_ms_i64();
    let _ = writeln!(out, "ts={}", crate::support::ts_ms_to_rfc3339(ts_ms));
    let _ = writeln!(out, "pid={}", std::process::id());
    let _ = writeln!(out, "kind={kind}");
    let _ = writeln!(out, "version={SERVER_NAME} {SERVER_VERSION}");
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let _ = writeln!(out, "cwd={}", cwd.to_string_lossy());
    let _ = writeln!(out, "args={:?}", std::env::args().collect::<Vec<_>>());
    let _ = writeln!(out, "detail={detail}");

    let _ = std::fs::write(path, out);
}

fn install_crash_reporter(storage_dir: std::path::PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let mut detail = info.to_string();
        let backtrace = std::backtrace::Backtrace::force_capture();
        let _ = write!(&mut detail, "\nbacktrace:\n{backtrace}");
        write_last_crash(&storage_dir, "panic", &detail);
        default_hook(info);
    }));
}

pub(crate) struct McpServer {
    initialized: bool,
    cache: TreeCache,
}

fn usage() -> &'static str {
    "tl_mcp — hierarchical task-list MCP server (stdio)\n\n\
USAGE:\n\
  tl_mcp [--storage-dir DIR]\n\
\n\
FLAGS:\n\
  -h, --help       Print this help and exit\n\
  -V, --version    Print version and exit\n\
\n\
NOTES:\n\
  - Repo-local store default: <repo>/.tasklist/\n\
  - TASKLIST_STORAGE_DIR overrides the default when no flag is given\n"
}

fn version_line() -> String {
    format!("tl_mcp {SERVER_VERSION}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = std::env::args().collect::<Vec<_>>();
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print!("{}", usage());
        return Ok(());
    }
    if args
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        println!("{}", version_line());
        return Ok(());
    }

    let storage_dir = parse_storage_dir();
    install_crash_reporter(storage_dir.clone());
    // Always emit a small, bounded session record for debugging MCP transport issues.
    // This is written to the store directory (repo-local by default) and never to stdout/stderr.
    let mut session_log = SessionLog::new(&storage_dir);
    let storage_dir_for_errors = storage_dir.clone();

    let store = FileStore::open(&storage_dir)?;
    let mut server = McpServer::new(TreeCache::new(store));

    let result = entry::run_stdio(&mut server, &mut session_log);
    match &result {
        Ok(()) => session_log.note_exit("eof"),
        Err(err) => {
            session_log.note_exit("error");
            write_last_crash(&storage_dir_for_errors, "error", &format!("{err:?}"));
        }
    }
    result
}
