use crate::server::calendar::WebApiService;
use calendar_core::{
    endpoint::{Endpoint, endpoint},
    types::{Event, Session, Token, User, UserId},
};
use std::sync::Arc;

/// One callable per [`WebApiService`] method.
#[derive(Clone)]
pub struct Endpoints {
    pub add_event: Endpoint<Event, String>,
    pub list_event: Endpoint<UserId, Vec<Event>>,
    pub delete_event: Endpoint<(String, UserId), ()>,
    pub sign_up: Endpoint<User, Session>,
    pub login: Endpoint<User, Session>,
    pub logout: Endpoint<Token, ()>,
}

impl Endpoints {
    pub fn new(service: Arc<dyn WebApiService>) -> Self {
        Self {
            add_event: endpoint(service.clone(), |s, event| s.add_event(event)),
            list_event: endpoint(service.clone(), |s, user_id| s.list_event(user_id)),
            delete_event: endpoint(
                service.clone(),
                |s, (event_id, user_id): (String, UserId)| s.delete_event(event_id, user_id),
            ),
            sign_up: endpoint(service.clone(), |s, user| s.sign_up(user)),
            login: endpoint(service.clone(), |s, user| s.login(user)),
            logout: endpoint(service, |s, token| s.logout(token)),
        }
    }
}
