//! Session tokens with a time-to-live.
//!
//! On Redis each session is a single `session:{token}` key holding the user
//! id, written with `SET EX` so expiry is left to the server. The `memory://`
//! store keeps a deadline next to each entry; expired entries are dropped when
//! read and swept whenever a new session is issued.

use calendar_core::{
    Result,
    storage::Cache,
    types::{Token, UserId},
};
use core::time::Duration;
use parking_lot::Mutex;
use rand::{Rng, distr::Alphanumeric};
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::{collections::HashMap, sync::Arc};
use tokio::time::Instant;

pub const TOKEN_LEN: usize = 32;

fn session_key(token: &Token) -> String {
    format!("session:{}", token.as_str())
}

/// Draws a fresh random token.
pub fn generate_token() -> Token {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();
    Token::from(token)
}

#[derive(Debug, Default)]
pub struct MemorySessions {
    sessions: Mutex<HashMap<Token, (UserId, Instant)>>,
}

impl MemorySessions {
    /// Number of stored sessions, expired ones not yet swept included.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub enum TokenStore {
    Redis {
        conn: MultiplexedConnection,
        ttl: Duration,
    },
    Memory {
        sessions: Arc<MemorySessions>,
        ttl: Duration,
    },
}

impl TokenStore {
    pub fn from_cache(cache: &Cache, ttl: Duration) -> Self {
        match cache {
            Cache::Redis(conn) => Self::Redis {
                conn: conn.clone(),
                ttl,
            },
            Cache::Memory => Self::in_memory(ttl),
        }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::Memory {
            sessions: Arc::default(),
            ttl,
        }
    }

    /// Opens a session for `user_id` and returns its token.
    pub async fn issue(&self, user_id: UserId) -> Result<Token> {
        let token = generate_token();
        match self {
            Self::Redis { conn, ttl } => {
                let mut conn = conn.clone();
                conn.set_ex::<_, _, ()>(session_key(&token), user_id, ttl.as_secs().max(1))
                    .await?;
            }
            Self::Memory { sessions, ttl } => {
                let now = Instant::now();
                let mut sessions = sessions.sessions.lock();
                sessions.retain(|_, &mut (_, deadline)| now < deadline);
                sessions.insert(token.clone(), (user_id, now + *ttl));
            }
        }
        Ok(token)
    }

    /// The user behind a live token, if any.
    pub async fn resolve(&self, token: &Token) -> Result<Option<UserId>> {
        if token.is_empty() {
            return Ok(None);
        }
        match self {
            Self::Redis { conn, .. } => {
                let mut conn = conn.clone();
                Ok(conn.get::<_, Option<UserId>>(session_key(token)).await?)
            }
            Self::Memory { sessions, .. } => {
                let mut sessions = sessions.sessions.lock();
                match sessions.get(token) {
                    Some(&(user_id, deadline)) if Instant::now() < deadline => Ok(Some(user_id)),
                    Some(_) => {
                        sessions.remove(token);
                        Ok(None)
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Removes the session. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &Token) -> Result<()> {
        match self {
            Self::Redis { conn, .. } => {
                let mut conn = conn.clone();
                conn.del::<_, ()>(session_key(token)).await?;
            }
            Self::Memory { sessions, .. } => {
                sessions.sessions.lock().remove(token);
            }
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Redis { conn, .. } => {
                let mut conn = conn.clone();
                redis::cmd("PING").query_async::<String>(&mut conn).await?;
                Ok(())
            }
            Self::Memory { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_random_alphanumerics() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.as_str().len(), TOKEN_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn issued_tokens_resolve_until_revoked() {
        let store = TokenStore::in_memory(Duration::from_secs(60));
        let token = store.issue(7).await.unwrap();

        assert_eq!(store.resolve(&token).await.unwrap(), Some(7));
        store.revoke(&token).await.unwrap();
        assert_eq!(store.resolve(&token).await.unwrap(), None);
        // Revoking twice is fine.
        store.revoke(&token).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_expire_after_ttl() {
        let store = TokenStore::in_memory(Duration::from_secs(60));
        let token = store.issue(1).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.resolve(&token).await.unwrap(), Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn issuing_sweeps_sessions_that_were_never_read() {
        let sessions = Arc::new(MemorySessions::default());
        let store = TokenStore::Memory {
            sessions: sessions.clone(),
            ttl: Duration::from_secs(60),
        };
        let stale = store.issue(1).await.unwrap();
        store.issue(2).await.unwrap();
        assert_eq!(sessions.len(), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        let fresh = store.issue(3).await.unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(store.resolve(&stale).await.unwrap(), None);
        assert_eq!(store.resolve(&fresh).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn unknown_and_empty_tokens_do_not_resolve() {
        let store = TokenStore::from_cache(&Cache::Memory, Duration::from_secs(60));
        assert_eq!(store.resolve(&Token::new("nope")).await.unwrap(), None);
        assert_eq!(store.resolve(&Token::default()).await.unwrap(), None);
        assert!(store.ping().await.is_ok());
    }
}
