//! Metadata accompanying each incoming query.

/// Identifies the user behind one query, for authorization and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMetadata {
    pub user_id: String,
}

impl QueryMetadata {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }
}
