//! [`AccountService`] over the user repository and the token store.

use crate::server::{repository::AccountRepository, store::TokenStore};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use calendar_core::{
    Error, Result,
    service::AccountService,
    types::{STATUS_OK, Session, Token, User},
};

/// The account capability served by this process.
#[derive(Clone)]
pub struct Accounts {
    repository: AccountRepository,
    tokens: TokenStore,
}

impl Accounts {
    pub fn new(repository: AccountRepository, tokens: TokenStore) -> Self {
        Self { repository, tokens }
    }
}

fn validate(user: &User) -> Result<()> {
    if user.email.trim().is_empty() {
        return Err(Error::InvalidRequest {
            reason: "email must not be empty".into(),
        });
    }
    if user.password.is_empty() {
        return Err(Error::InvalidRequest {
            reason: "password must not be empty".into(),
        });
    }
    Ok(())
}

// CPU bound; runs on the blocking pool.
async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| Error::Internal {
                context: format!("failed to hash password: {err}"),
            })
    })
    .await
    .map_err(|err| Error::Internal {
        context: err.to_string(),
    })?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|err| Error::Internal {
            context: format!("stored password hash is invalid: {err}"),
        })?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|err| Error::Internal {
        context: err.to_string(),
    })?
}

#[tonic::async_trait]
impl AccountService for Accounts {
    async fn is_auth(&self, token: Token) -> Result<Token> {
        match self.tokens.resolve(&token).await? {
            Some(_) => Ok(token),
            None => Err(Error::Unauthenticated),
        }
    }

    #[tracing::instrument(skip_all, fields(email = %user.email))]
    async fn sign_up(&self, user: User) -> Result<Session> {
        validate(&user)?;
        let email = user.email.trim().to_string();
        let hash = hash_password(user.password).await?;

        let record = self.repository.create_user(&email, &hash).await?;
        let token = self.tokens.issue(record.id).await?;
        tracing::info!(user_id = record.id, "account created");

        Ok(Session {
            user_id: record.id,
            token,
        })
    }

    #[tracing::instrument(skip_all, fields(email = %user.email))]
    async fn login(&self, user: User) -> Result<Session> {
        validate(&user)?;
        // Unknown email and wrong password are indistinguishable to the caller.
        let Some(record) = self.repository.find_by_email(user.email.trim()).await? else {
            return Err(Error::Unauthenticated);
        };
        if !verify_password(user.password, record.password_hash).await? {
            return Err(Error::Unauthenticated);
        }

        let token = self.tokens.issue(record.id).await?;
        tracing::debug!(user_id = record.id, "session opened");
        Ok(Session {
            user_id: record.id,
            token,
        })
    }

    async fn logout(&self, token: Token) -> Result<()> {
        if token.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "token must not be empty".into(),
            });
        }
        self.tokens.revoke(&token).await
    }

    async fn service_status(&self) -> Result<i32> {
        self.repository.ping().await?;
        self.tokens.ping().await?;
        Ok(STATUS_OK)
    }
}
