#![forbid(unsafe_code)]

/// A positional identifier: the dotted, 1-based path of sibling positions
/// from the tree roots down to one node, e.g. `1.3.2`.
///
/// Paths are view artifacts, never stored on a node. Any mutation that
/// shifts sibling positions silently changes what a previously rendered
/// identifier points at; a path is only meaningful at the moment it is
/// resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskPath {
    indices: Vec<usize>,
}

impl TaskPath {
    /// 1-based sibling positions, roots first. Never empty, never zero.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn depth(&self) -> usize {
        self.indices.len()
    }

    pub fn parse(value: &str) -> Result<Self, TaskPathError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TaskPathError::Empty);
        }

        let mut indices = Vec::new();
        for segment in value.split('.') {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TaskPathError::InvalidSegment);
            }
            let index = segment
                .parse::<usize>()
                .map_err(|_| TaskPathError::InvalidSegment)?;
            if index == 0 {
                return Err(TaskPathError::InvalidSegment);
            }
            indices.push(index);
        }

        Ok(Self { indices })
    }

    pub fn root(ordinal: usize) -> Self {
        Self {
            indices: vec![ordinal],
        }
    }

    pub fn child(&self, ordinal: usize) -> Self {
        let mut indices = self.indices.clone();
        indices.push(ordinal);
        Self { indices }
    }
}

impl std::fmt::Display for TaskPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for index in &self.indices {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{index}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskPathError {
    Empty,
    InvalidSegment,
}

impl std::fmt::Display for TaskPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "task id must not be empty"),
            Self::InvalidSegment => {
                write!(f, "task id segments must be positive integers joined by '.'")
            }
        }
    }
}

impl std::error::Error for TaskPathError {}
