//! User accounts, keyed by email.
//!
//! [`AccountRepository`] dispatches over the process-wide
//! [`Database`] handle: a `users` table on Postgres, or a map behind a mutex
//! for `memory://`.

use calendar_core::{Error, Result, storage::Database, types::UserId};
use parking_lot::Mutex;
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};

const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

/// A stored account. The password is only ever kept as an argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Default)]
pub struct MemoryUsers {
    inner: Mutex<MemoryUsersInner>,
}

#[derive(Debug, Default)]
struct MemoryUsersInner {
    next_id: UserId,
    by_email: HashMap<String, UserRecord>,
}

#[derive(Debug, Clone)]
pub enum AccountRepository {
    Postgres(PgPool),
    Memory(Arc<MemoryUsers>),
}

impl AccountRepository {
    /// Wraps `database`, creating the `users` table on Postgres if needed.
    pub async fn from_database(database: &Database) -> Result<Self> {
        match database {
            Database::Postgres(pool) => {
                sqlx::query(CREATE_USERS).execute(pool).await?;
                Ok(Self::Postgres(pool.clone()))
            }
            Database::Memory => Ok(Self::in_memory()),
        }
    }

    pub fn in_memory() -> Self {
        Self::Memory(Arc::default())
    }

    /// Inserts a new account.
    ///
    /// Returns [`Error::AlreadyExists`] if the email is taken.
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<UserRecord> {
        let id = match self {
            Self::Postgres(pool) => {
                let id: Option<i64> = sqlx::query_scalar(
                    "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
                     ON CONFLICT (email) DO NOTHING RETURNING id",
                )
                .bind(email)
                .bind(password_hash)
                .fetch_optional(pool)
                .await?;
                id.map(user_id).transpose()?
            }
            Self::Memory(users) => {
                let mut users = users.inner.lock();
                if users.by_email.contains_key(email) {
                    None
                } else {
                    users.next_id += 1;
                    let id = users.next_id;
                    users.by_email.insert(
                        email.to_string(),
                        UserRecord {
                            id,
                            email: email.to_string(),
                            password_hash: password_hash.to_string(),
                        },
                    );
                    Some(id)
                }
            }
        };

        let id = id.ok_or_else(|| Error::AlreadyExists {
            what: "user".into(),
        })?;
        Ok(UserRecord {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        match self {
            Self::Postgres(pool) => {
                let row: Option<(i64, String)> =
                    sqlx::query_as("SELECT id, password_hash FROM users WHERE email = $1")
                        .bind(email)
                        .fetch_optional(pool)
                        .await?;
                row.map(|(id, password_hash)| {
                    Ok(UserRecord {
                        id: user_id(id)?,
                        email: email.to_string(),
                        password_hash,
                    })
                })
                .transpose()
            }
            Self::Memory(users) => Ok(users.inner.lock().by_email.get(email).cloned()),
        }
    }

    /// Round-trips to the database.
    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            Self::Memory(_) => Ok(()),
        }
    }
}

fn user_id(id: i64) -> Result<UserId> {
    UserId::try_from(id).map_err(|_| Error::Internal {
        context: format!("negative user id {id}"),
    })
}
