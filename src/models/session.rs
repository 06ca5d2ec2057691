use crate::crypto::token::TokenError;
use crate::models::user::UserRecord;

/// The result of reading a session cookie.
///
/// Reads never fail: a missing, forged or corrupted cookie is reported here and
/// callers treat anything but `Valid` as anonymous.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The cookie decrypted to a user record.
    Valid(UserRecord),
    /// No cookie, an empty cookie, or a cookie holding encrypted `null`.
    NoSession,
    /// The cookie is present but could not be decrypted or parsed.
    Malformed(TokenError),
}

impl SessionState {
    /// Collapses the state to the user, if any.
    pub fn into_user(self) -> Option<UserRecord> {
        match self {
            SessionState::Valid(user) => Some(user),
            SessionState::NoSession | SessionState::Malformed(_) => None,
        }
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            SessionState::Valid(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SessionState::Malformed(_))
    }
}

impl From<Option<UserRecord>> for SessionState {
    fn from(user: Option<UserRecord>) -> Self {
        user.map_or(SessionState::NoSession, SessionState::Valid)
    }
}
