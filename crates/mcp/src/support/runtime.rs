#![forbid(unsafe_code)]

use std::path::PathBuf;

fn default_repo_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut current = cwd.clone();
    loop {
        if current.join(".git").exists() {
            return current;
        }
        if !current.pop() {
            break;
        }
    }
    cwd
}

/// Storage directory resolution: `--storage-dir DIR` wins, then the
/// `TASKLIST_STORAGE_DIR` env var, then a repo-local `.tasklist/`.
pub(crate) fn parse_storage_dir() -> PathBuf {
    let mut args = std::env::args().skip(1);
    let mut storage_dir: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        if arg.as_str() == "--storage-dir"
            && let Some(value) = args.next()
        {
            storage_dir = Some(PathBuf::from(value));
        }
    }
    if let Some(dir) = storage_dir {
        return dir;
    }
    if let Some(dir) = std::env::var_os("TASKLIST_STORAGE_DIR") {
        return PathBuf::from(dir);
    }
    default_repo_root().join(".tasklist")
}
