//! The web-api capability: calendar events plus session pass-through.
//!
//! Events live in this service's own [`EventRepository`]. Sign-up, login and
//! logout are forwarded unchanged to an [`AccountService`]; in production
//! that is an `AccountClient` talking to the account server, so a non-OK
//! status from upstream reaches the caller as-is.

use crate::server::repository::EventRepository;
use calendar_core::{
    Error, Result,
    service::AccountService,
    types::{Event, Session, Token, User, UserId},
};
use std::sync::Arc;
use uuid::Uuid;

#[tonic::async_trait]
pub trait WebApiService: Send + Sync + 'static {
    /// Stores a new event and returns its id. Any id on the input is ignored.
    async fn add_event(&self, event: Event) -> Result<String>;

    async fn list_event(&self, user_id: UserId) -> Result<Vec<Event>>;

    /// Deletes one of `user_id`'s events.
    async fn delete_event(&self, event_id: String, user_id: UserId) -> Result<()>;

    async fn sign_up(&self, user: User) -> Result<Session>;

    async fn login(&self, user: User) -> Result<Session>;

    async fn logout(&self, token: Token) -> Result<()>;
}

pub struct Calendar {
    events: EventRepository,
    accounts: Arc<dyn AccountService>,
}

impl Calendar {
    pub fn new(events: EventRepository, accounts: Arc<dyn AccountService>) -> Self {
        Self { events, accounts }
    }
}

fn require_user(user_id: UserId) -> Result<()> {
    if user_id == 0 {
        return Err(Error::InvalidRequest {
            reason: "user_id must be set".into(),
        });
    }
    Ok(())
}

fn validate(event: &Event) -> Result<()> {
    require_user(event.user_id)?;
    if event.title.trim().is_empty() {
        return Err(Error::InvalidRequest {
            reason: "title must not be empty".into(),
        });
    }
    if event.end_time < event.start_time {
        return Err(Error::InvalidRequest {
            reason: "end_time must not be before start_time".into(),
        });
    }
    Ok(())
}

#[tonic::async_trait]
impl WebApiService for Calendar {
    #[tracing::instrument(skip_all, fields(user_id = event.user_id))]
    async fn add_event(&self, event: Event) -> Result<String> {
        validate(&event)?;
        let event = Event {
            id: Uuid::now_v7().to_string(),
            ..event
        };
        self.events.insert(&event).await?;
        tracing::debug!(event_id = %event.id, "event added");
        Ok(event.id)
    }

    async fn list_event(&self, user_id: UserId) -> Result<Vec<Event>> {
        require_user(user_id)?;
        self.events.list_by_user(user_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_event(&self, event_id: String, user_id: UserId) -> Result<()> {
        require_user(user_id)?;
        if event_id.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "event_id must not be empty".into(),
            });
        }
        if self.events.delete(&event_id, user_id).await? {
            Ok(())
        } else {
            Err(Error::NotFound {
                what: "event".into(),
            })
        }
    }

    async fn sign_up(&self, user: User) -> Result<Session> {
        self.accounts.sign_up(user).await
    }

    async fn login(&self, user: User) -> Result<Session> {
        self.accounts.login(user).await
    }

    async fn logout(&self, token: Token) -> Result<()> {
        self.accounts.logout(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calendar_core::types::STATUS_OK;
    use parking_lot::Mutex;
    use tonic::{Code, Status};

    /// Records forwarded calls; rejects logins for `locked@example.com`.
    #[derive(Default)]
    struct RecordingAccounts {
        calls: Mutex<Vec<&'static str>>,
    }

    #[tonic::async_trait]
    impl AccountService for RecordingAccounts {
        async fn is_auth(&self, token: Token) -> Result<Token> {
            self.calls.lock().push("is_auth");
            Ok(token)
        }

        async fn sign_up(&self, _user: User) -> Result<Session> {
            self.calls.lock().push("sign_up");
            Ok(Session {
                user_id: 9,
                token: Token::new("t"),
            })
        }

        async fn login(&self, user: User) -> Result<Session> {
            self.calls.lock().push("login");
            if user.email == "locked@example.com" {
                return Err(Status::permission_denied("locked").into());
            }
            Ok(Session {
                user_id: 9,
                token: Token::new("t"),
            })
        }

        async fn logout(&self, _token: Token) -> Result<()> {
            self.calls.lock().push("logout");
            Ok(())
        }

        async fn service_status(&self) -> Result<i32> {
            Ok(STATUS_OK)
        }
    }

    fn calendar() -> (Calendar, Arc<RecordingAccounts>) {
        let accounts = Arc::new(RecordingAccounts::default());
        let calendar = Calendar::new(EventRepository::in_memory(), accounts.clone());
        (calendar, accounts)
    }

    fn standup(user_id: UserId) -> Event {
        Event {
            id: "client-chosen".into(),
            user_id,
            title: "standup".into(),
            description: "daily".into(),
            start_time: 1_700_000_000,
            end_time: 1_700_000_900,
        }
    }

    #[tokio::test]
    async fn added_events_get_fresh_ids_and_are_listed() {
        let (calendar, _) = calendar();
        let first = calendar.add_event(standup(1)).await.unwrap();
        let second = calendar.add_event(standup(1)).await.unwrap();

        assert_ne!(first, "client-chosen");
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());

        let listed = calendar.list_event(1).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|e| e.title == "standup"));
        assert!(calendar.list_event(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_events_are_rejected() {
        let (calendar, _) = calendar();
        let untitled = Event {
            title: "  ".into(),
            ..standup(1)
        };
        let backwards = Event {
            end_time: 0,
            ..standup(1)
        };

        for event in [untitled, backwards, standup(0)] {
            assert!(matches!(
                calendar.add_event(event).await,
                Err(Error::InvalidRequest { .. })
            ));
        }
    }

    #[tokio::test]
    async fn deleting_someone_elses_event_is_not_found() {
        let (calendar, _) = calendar();
        let id = calendar.add_event(standup(1)).await.unwrap();

        assert!(matches!(
            calendar.delete_event(id.clone(), 2).await,
            Err(Error::NotFound { .. })
        ));
        calendar.delete_event(id.clone(), 1).await.unwrap();
        assert!(matches!(
            calendar.delete_event(id, 1).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn session_calls_are_forwarded_unchanged() {
        let (calendar, accounts) = calendar();
        let user = User {
            email: "ada@example.com".into(),
            password: "hunter2".into(),
        };

        assert_eq!(calendar.sign_up(user.clone()).await.unwrap().user_id, 9);
        calendar.login(user).await.unwrap();
        calendar.logout(Token::new("t")).await.unwrap();
        assert_eq!(*accounts.calls.lock(), ["sign_up", "login", "logout"]);

        let locked = User {
            email: "locked@example.com".into(),
            password: "x".into(),
        };
        let err = calendar.login(locked).await.unwrap_err();
        assert_eq!(Status::from(err).code(), Code::PermissionDenied);
    }
}
