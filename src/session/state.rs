use crate::auth::models::User;

/// Where the session stands, as far as this process knows
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Not yet determined; the initial profile check has not finished
    Unknown,
    Unauthenticated,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}
