use serde::{Deserialize, Serialize};

/// The authenticated identity behind the current request.
///
/// Built by the authentication middleware once the session cookie resolves
/// and dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            username: None,
            full_name: None,
        }
    }

    /// A viewer for a user that has no session yet, used when creating one.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self::new(user_id, String::new())
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}
