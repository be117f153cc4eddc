//! Calendar events, owned by exactly one user each.

use calendar_core::{
    Error, Result,
    storage::Database,
    types::{Event, UserId},
};
use parking_lot::RwLock;
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};

const CREATE_EVENTS: &str = "CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    user_id BIGINT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    start_time BIGINT NOT NULL,
    end_time BIGINT NOT NULL
)";

const CREATE_EVENTS_BY_USER: &str =
    "CREATE INDEX IF NOT EXISTS events_user_id_start_time ON events (user_id, start_time)";

type EventRow = (String, i64, String, String, i64, i64);

#[derive(Debug, Default)]
pub struct MemoryEvents {
    events: RwLock<HashMap<String, Event>>,
}

#[derive(Debug, Clone)]
pub enum EventRepository {
    Postgres(PgPool),
    Memory(Arc<MemoryEvents>),
}

impl EventRepository {
    /// Wraps `database`, creating the `events` table on Postgres if needed.
    pub async fn from_database(database: &Database) -> Result<Self> {
        match database {
            Database::Postgres(pool) => {
                sqlx::query(CREATE_EVENTS).execute(pool).await?;
                sqlx::query(CREATE_EVENTS_BY_USER).execute(pool).await?;
                Ok(Self::Postgres(pool.clone()))
            }
            Database::Memory => Ok(Self::in_memory()),
        }
    }

    pub fn in_memory() -> Self {
        Self::Memory(Arc::default())
    }

    pub async fn insert(&self, event: &Event) -> Result<()> {
        match self {
            Self::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO events (id, user_id, title, description, start_time, end_time) \
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(&event.id)
                .bind(db_user_id(event.user_id)?)
                .bind(&event.title)
                .bind(&event.description)
                .bind(event.start_time)
                .bind(event.end_time)
                .execute(pool)
                .await?;
            }
            Self::Memory(events) => {
                events
                    .events
                    .write()
                    .insert(event.id.clone(), event.clone());
            }
        }
        Ok(())
    }

    /// Every event of `user_id`, earliest first.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Event>> {
        match self {
            Self::Postgres(pool) => {
                let rows: Vec<EventRow> = sqlx::query_as(
                    "SELECT id, user_id, title, description, start_time, end_time FROM events \
                     WHERE user_id = $1 ORDER BY start_time, id",
                )
                .bind(db_user_id(user_id)?)
                .fetch_all(pool)
                .await?;
                Ok(rows
                    .into_iter()
                    .map(|(id, _, title, description, start_time, end_time)| Event {
                        id,
                        user_id,
                        title,
                        description,
                        start_time,
                        end_time,
                    })
                    .collect())
            }
            Self::Memory(events) => {
                let mut owned: Vec<Event> = events
                    .events
                    .read()
                    .values()
                    .filter(|event| event.user_id == user_id)
                    .cloned()
                    .collect();
                owned.sort_by(|a, b| (a.start_time, &a.id).cmp(&(b.start_time, &b.id)));
                Ok(owned)
            }
        }
    }

    /// Deletes the event if it exists and belongs to `user_id`.
    ///
    /// Returns whether anything was deleted.
    pub async fn delete(&self, event_id: &str, user_id: UserId) -> Result<bool> {
        match self {
            Self::Postgres(pool) => {
                let done = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
                    .bind(event_id)
                    .bind(db_user_id(user_id)?)
                    .execute(pool)
                    .await?;
                Ok(done.rows_affected() > 0)
            }
            Self::Memory(events) => {
                let mut events = events.events.write();
                match events.get(event_id) {
                    Some(event) if event.user_id == user_id => {
                        events.remove(event_id);
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            }
        }
    }
}

// BIGINT is signed; ids above i64::MAX cannot have been stored.
fn db_user_id(user_id: UserId) -> Result<i64> {
    i64::try_from(user_id).map_err(|_| Error::InvalidRequest {
        reason: format!("user_id {user_id} is out of range"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, user_id: UserId, start_time: i64) -> Event {
        Event {
            id: id.into(),
            user_id,
            title: format!("event {id}"),
            start_time,
            end_time: start_time + 60,
            ..Event::default()
        }
    }

    #[tokio::test]
    async fn lists_only_the_owners_events_in_start_order() {
        let repo = EventRepository::in_memory();
        repo.insert(&event("b", 1, 200)).await.unwrap();
        repo.insert(&event("a", 1, 100)).await.unwrap();
        repo.insert(&event("c", 2, 50)).await.unwrap();

        let ids: Vec<_> = repo
            .list_by_user(1)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(repo.list_by_user(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_ownership() {
        let repo = EventRepository::in_memory();
        repo.insert(&event("a", 1, 100)).await.unwrap();

        assert!(!repo.delete("a", 2).await.unwrap());
        assert!(!repo.delete("missing", 1).await.unwrap());
        assert!(repo.delete("a", 1).await.unwrap());
        assert!(!repo.delete("a", 1).await.unwrap());
    }

    #[test]
    fn oversized_user_ids_are_rejected() {
        assert_eq!(db_user_id(42).unwrap(), 42);
        assert!(matches!(
            db_user_id(u64::MAX),
            Err(Error::InvalidRequest { .. })
        ));
    }
}
