//! # Domain Types
//!
//! The values that flow between the transport, endpoint and service layers of
//! both services. They are deliberately thin: the services treat credentials
//! and tokens as opaque strings and events as plain records.
//!
//! Secrets (`User::password`, `Token`) never show up in `Debug` output so they
//! can't leak through `tracing` fields.

use core::fmt;

/// Identifier assigned to a user account.
pub type UserId = u64;

/// Status reported by a healthy `ServiceStatus` call.
pub const STATUS_OK: i32 = 200;

/// Opaque session token.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Token {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Credentials submitted to sign-up and login.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct User {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// The `(id, token)` pair handed out by sign-up and login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub token: Token,
}

/// A calendar event owned by a single user. Times are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    pub id: String,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub start_time: i64,
    pub end_time: i64,
}
