//! Aspect module
//!
//! Describes the trackable numeric fields ("aspects") of the shared campaign
//! record, such as gold, XP, or loot count.

/// Value type an aspect tracks. Only integer aspects exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
}

/// One updatable field of the shared campaign record.
///
/// Immutable after registration; the name becomes a literal alternative in
/// the tokenizer's master pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aspect {
    pub name: String,
    pub help_info: String,
    pub value_kind: ValueKind,
    /// User ids permitted to mutate this aspect. Checked before any store access.
    pub allowed_users: Vec<String>,
}

impl Aspect {
    pub fn new(
        name: impl Into<String>,
        help_info: impl Into<String>,
        value_kind: ValueKind,
        allowed_users: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            help_info: help_info.into(),
            value_kind,
            allowed_users,
        }
    }

    /// True if `user_id` may mutate this aspect.
    pub fn allows(&self, user_id: &str) -> bool {
        self.allowed_users.iter().any(|allowed| allowed == user_id)
    }
}
