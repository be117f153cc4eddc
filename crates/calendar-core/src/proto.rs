//! Generated gRPC bindings and their conversions to the domain types.
//!
//! The two packages declare their own copies of `User`, `Token` and `Session`
//! so that each service definition stands alone on the wire; both sets
//! convert into the same domain types.

use crate::types::{Event, Session, Token, User};

#[allow(clippy::all, clippy::pedantic)]
pub mod account {
    tonic::include_proto!("calendar.account");
}

#[allow(clippy::all, clippy::pedantic)]
pub mod webapi {
    tonic::include_proto!("calendar.webapi");
}

/// Encoded descriptors for both packages, served through reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("calendar_descriptor");

macro_rules! session_conversions {
    ($package:ident) => {
        impl From<$package::User> for User {
            fn from(user: $package::User) -> Self {
                Self {
                    email: user.email,
                    password: user.password,
                }
            }
        }

        impl From<User> for $package::User {
            fn from(user: User) -> Self {
                Self {
                    email: user.email,
                    password: user.password,
                }
            }
        }

        impl From<$package::Token> for Token {
            fn from(token: $package::Token) -> Self {
                Token::new(token.token)
            }
        }

        impl From<Token> for $package::Token {
            fn from(token: Token) -> Self {
                Self {
                    token: token.into_inner(),
                }
            }
        }

        impl From<$package::Session> for Session {
            fn from(session: $package::Session) -> Self {
                Self {
                    user_id: session.id,
                    token: Token::new(session.token),
                }
            }
        }

        impl From<Session> for $package::Session {
            fn from(session: Session) -> Self {
                Self {
                    id: session.user_id,
                    token: session.token.into_inner(),
                }
            }
        }
    };
}

session_conversions!(account);
session_conversions!(webapi);

impl From<webapi::Event> for Event {
    fn from(event: webapi::Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            title: event.title,
            description: event.description,
            start_time: event.start_time,
            end_time: event.end_time,
        }
    }
}

impl From<Event> for webapi::Event {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            user_id: event.user_id,
            title: event.title,
            description: event.description,
            start_time: event.start_time,
            end_time: event.end_time,
        }
    }
}
