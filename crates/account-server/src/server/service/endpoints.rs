use calendar_core::{
    endpoint::{Endpoint, endpoint},
    service::AccountService,
    types::{Session, Token, User},
};
use std::sync::Arc;

/// One callable per [`AccountService`] method.
#[derive(Clone)]
pub struct Endpoints {
    pub is_auth: Endpoint<Token, Token>,
    pub sign_up: Endpoint<User, Session>,
    pub login: Endpoint<User, Session>,
    pub logout: Endpoint<Token, ()>,
    pub service_status: Endpoint<(), i32>,
}

impl Endpoints {
    pub fn new(service: Arc<dyn AccountService>) -> Self {
        Self {
            is_auth: endpoint(service.clone(), |s, token| s.is_auth(token)),
            sign_up: endpoint(service.clone(), |s, user| s.sign_up(user)),
            login: endpoint(service.clone(), |s, user| s.login(user)),
            logout: endpoint(service.clone(), |s, token| s.logout(token)),
            service_status: endpoint(service, |s, _: ()| s.service_status()),
        }
    }
}
