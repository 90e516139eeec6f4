use serde::{Deserialize, Serialize};

/// Who is editing configuration, taken from request headers.
///
/// Only used to stamp `last_written_by` on override records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            user_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Display name preferred over the id; `None` for anonymous callers
    pub fn author(&self) -> Option<String> {
        self.user_name.clone().or_else(|| self.user_id.clone())
    }
}
