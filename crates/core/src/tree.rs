#![forbid(unsafe_code)]

use crate::model::{TaskNode, TaskState};
use crate::path::TaskPath;
use serde::{Deserialize, Serialize};

/// The ordered task tree of one identity. The serde shape of this type is
/// the durable record shape: `{ "tasks": [ ... ] }`, recursive, with no
/// identifier and no parent field anywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTree {
    #[serde(default)]
    pub tasks: Vec<TaskNode>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddTaskError {
    ParentNotFound,
    EmptyDescription,
}

impl std::fmt::Display for AddTaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParentNotFound => write!(f, "parent task not found"),
            Self::EmptyDescription => write!(f, "task description must not be empty"),
        }
    }
}

impl std::error::Error for AddTaskError {}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, path: &TaskPath) -> Option<&TaskNode> {
        node_ref(&self.tasks, path.indices())
    }

    pub fn get_mut(&mut self, path: &TaskPath) -> Option<&mut TaskNode> {
        node_mut(&mut self.tasks, path.indices())
    }

    /// Appends a new pending task, as a root when `parent` is `None`,
    /// otherwise as the last child of the resolved parent. Returns the new
    /// node's path.
    pub fn add_task(
        &mut self,
        parent: Option<&TaskPath>,
        description: impl Into<String>,
    ) -> Result<TaskPath, AddTaskError> {
        let description = description.into();
        let description = description.trim();
        if description.is_empty() {
            return Err(AddTaskError::EmptyDescription);
        }
        let node = TaskNode::new(description);

        match parent {
            None => {
                self.tasks.push(node);
                Ok(TaskPath::root(self.tasks.len()))
            }
            Some(parent_path) => {
                let Some(parent_node) = self.get_mut(parent_path) else {
                    return Err(AddTaskError::ParentNotFound);
                };
                parent_node.subtasks.push(node);
                let ordinal = parent_node.subtasks.len();
                Ok(parent_path.child(ordinal))
            }
        }
    }

    /// Sets the state of the node at `path`. Not-found is a normal
    /// outcome, reported as `false`.
    pub fn update_state(&mut self, path: &TaskPath, state: TaskState) -> bool {
        match self.get_mut(path) {
            Some(node) => {
                node.state = state;
                true
            }
            None => false,
        }
    }

    /// Removes the node at `path` together with its entire subtree.
    ///
    /// There is no renumbering step: identifiers are recomputed from
    /// position on every lookup, so later siblings (and their subtrees)
    /// simply resolve under shifted identifiers afterwards.
    pub fn delete(&mut self, path: &TaskPath) -> bool {
        let Some((&last, ancestors)) = path.indices().split_last() else {
            return false;
        };
        let siblings = if ancestors.is_empty() {
            &mut self.tasks
        } else {
            match node_mut(&mut self.tasks, ancestors) {
                Some(parent) => &mut parent.subtasks,
                None => return false,
            }
        };
        if last == 0 || last > siblings.len() {
            return false;
        }
        siblings.remove(last - 1);
        true
    }

    /// Depth-first listing, parents before children, siblings in insertion
    /// order. The filter is applied to each node independently: filtering
    /// a parent out does not hide its matching descendants, and paths
    /// always reflect full-tree position, never filtered position.
    pub fn list(&self, filter: Option<TaskState>) -> Vec<(TaskPath, &TaskNode)> {
        let mut out = Vec::new();
        for (position, node) in self.tasks.iter().enumerate() {
            collect(node, TaskPath::root(position + 1), filter, &mut out);
        }
        out
    }
}

fn collect<'a>(
    node: &'a TaskNode,
    path: TaskPath,
    filter: Option<TaskState>,
    out: &mut Vec<(TaskPath, &'a TaskNode)>,
) {
    if filter.is_none_or(|state| node.state == state) {
        out.push((path.clone(), node));
    }
    for (position, child) in node.subtasks.iter().enumerate() {
        collect(child, path.child(position + 1), filter, out);
    }
}

fn node_ref<'a>(roots: &'a [TaskNode], indices: &[usize]) -> Option<&'a TaskNode> {
    let (&first, rest) = indices.split_first()?;
    let mut node = roots.get(first.checked_sub(1)?)?;
    for &index in rest {
        node = node.subtasks.get(index.checked_sub(1)?)?;
    }
    Some(node)
}

fn node_mut<'a>(roots: &'a mut Vec<TaskNode>, indices: &[usize]) -> Option<&'a mut TaskNode> {
    let (&first, rest) = indices.split_first()?;
    let mut node = roots.get_mut(first.checked_sub(1)?)?;
    for &index in rest {
        node = node.subtasks.get_mut(index.checked_sub(1)?)?;
    }
    Some(node)
}
