use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What the session layer needs to know about an identity.
pub trait SessionIdentity {
    /// Value stored in the session to find this identity again.
    fn session_id(&self) -> i64;

    fn is_authenticated(&self) -> bool;
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub joined_at: String,
    pub is_admin: bool,
}

impl SessionIdentity for User {
    fn session_id(&self) -> i64 {
        self.id
    }

    // Only users loaded from the store ever reach a session.
    fn is_authenticated(&self) -> bool {
        true
    }
}
