#![forbid(unsafe_code)]

pub mod ids;
mod markdown;
mod model;
mod path;
mod tree;

pub use markdown::render_markdown;
pub use model::{TaskNode, TaskState};
pub use path::{TaskPath, TaskPathError};
pub use tree::{AddTaskError, TaskTree};
