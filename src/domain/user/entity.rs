//! User entity and request identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::concurrency::Versioned;

/// Numeric user identifier assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered user account
///
/// A `User` always carries a password hash; there is no way to build one
/// without it.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    id: UserId,
    created_at: DateTime<Utc>,
    name: String,
    email: String,
    /// Argon2 PHC string - never serialized
    #[serde(skip_serializing)]
    password_hash: String,
    activated: bool,
    #[serde(skip_serializing)]
    version: i32,
}

impl User {
    /// Rehydrate a user from a stored row
    pub fn from_parts(
        id: UserId,
        created_at: DateTime<Utc>,
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        activated: bool,
        version: i32,
    ) -> Self {
        Self {
            id,
            created_at,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            activated,
            version,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn activate(&mut self) {
        self.activated = true;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password_hash(&mut self, hash: impl Into<String>) {
        self.password_hash = hash.into();
    }
}

impl Versioned for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn version(&self) -> i32 {
        self.version
    }

    fn set_version(&mut self, version: i32) {
        self.version = version;
    }
}

/// A user that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Who is making the current request
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::from_parts(
            UserId::new(1),
            Utc::now(),
            "Alice",
            "alice@example.com",
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
            false,
            1,
        )
    }

    #[test]
    fn test_serialization_hides_hash_and_version() {
        let json = serde_json::to_value(user()).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["activated"], false);
        assert!(json.get("password_hash").is_none());
        assert!(json.get("version").is_none());
    }

    #[test]
    fn test_anonymous_identity() {
        assert!(Identity::Anonymous.is_anonymous());
        assert!(Identity::Anonymous.user().is_none());

        let identity = Identity::User(user());
        assert_eq!(identity.user().map(|u| u.id()), Some(UserId::new(1)));
    }
}
