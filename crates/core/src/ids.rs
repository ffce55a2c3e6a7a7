#![forbid(unsafe_code)]

pub const DEFAULT_USER: &str = "default_user";
pub const DEFAULT_SESSION: &str = "default_session";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id(&value)?;
        Ok(Self(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id(&value)?;
        Ok(Self(value))
    }
}

/// The (user, session) pair that scopes one task tree. Both halves are
/// opaque to the engine beyond the character validation below.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user: UserId,
    pub session: SessionId,
}

impl Identity {
    pub fn new(user: UserId, session: SessionId) -> Self {
        Self { user, session }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            user: UserId(DEFAULT_USER.to_string()),
            session: SessionId(DEFAULT_SESSION.to_string()),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user.as_str(), self.session.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdError {
    Empty,
    TooLong,
    InvalidFirstChar,
    InvalidChar { ch: char, index: usize },
}

impl std::fmt::Display for IdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "id must not be empty"),
            Self::TooLong => write!(f, "id must be at most 128 characters"),
            Self::InvalidFirstChar => write!(f, "id must start with an alphanumeric character"),
            Self::InvalidChar { ch, index } => {
                write!(f, "id contains invalid character {ch:?} at index {index}")
            }
        }
    }
}

impl std::error::Error for IdError {}

// Each id becomes a single path component of the durable record, so `/`
// (and anything else a filesystem could interpret) is rejected outright.
fn validate_id(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value.chars().count() > 128 {
        return Err(IdError::TooLong);
    }
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(IdError::Empty);
    };
    if !first.is_ascii_alphanumeric() {
        return Err(IdError::InvalidFirstChar);
    }
    for (index, ch) in value.chars().enumerate() {
        if index == 0 {
            continue;
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            continue;
        }
        return Err(IdError::InvalidChar { ch, index });
    }
    Ok(())
}
