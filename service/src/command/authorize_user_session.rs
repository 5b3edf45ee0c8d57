//! [`Command`] for authorizing a [`User`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    token, Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`].
///
/// Silently renews an expired access [`session::Token`] when a valid refresh
/// one is provided along.
#[derive(Clone, Debug)]
pub struct AuthorizeUserSession {
    /// Access [`session::Token`] to authorize.
    pub access_token: Option<session::Token>,

    /// Refresh [`session::Token`] for a silent renewal.
    pub refresh_token: Option<session::Token>,
}

/// Output of [`AuthorizeUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub enum Output {
    /// Access [`session::Token`] has been verified as is.
    Authorized(Session),

    /// [`Session`] has been renewed with the refresh [`session::Token`].
    ///
    /// The new [`session::TokenPair`] should be handed back to the client.
    Renewed {
        /// Renewed [`Session`].
        session: Session,

        /// Freshly issued [`session::TokenPair`].
        tokens: session::TokenPair,
    },
}

impl Output {
    /// Returns the authorized [`Session`].
    #[must_use]
    pub const fn session(&self) -> &Session {
        match self {
            Self::Authorized(session) | Self::Renewed { session, .. } => {
                session
            }
        }
    }
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession {
            access_token,
            refresh_token,
        } = cmd;

        if access_token.is_none() && refresh_token.is_none() {
            return Err(tracerr::new!(E::TokenRequired));
        }

        let codec = &self.config().tokens;

        if let Some(token) = &access_token {
            if let Ok(session) = codec.verify(token) {
                self.check_user_exists(session.user_id).await?;
                return Ok(Output::Authorized(session));
            }
        }

        let Some(token) = &refresh_token else {
            return Err(tracerr::new!(E::InvalidToken));
        };

        let session = codec.verify(token).map_err(|e| {
            if let Some(stale) = codec.decode(token) {
                tracing::debug!(
                    user_id = %stale.user_id,
                    "refresh token rejected: {e}",
                );
            }
            tracerr::new!(E::SessionExpired)
        })?;

        // The renewal chain is capped by the original credentials
        // authentication, not by the latest reissue.
        let expires =
            session.authenticated_at.coerce() + codec.max_session_age();
        if DateTime::now() > expires {
            return Err(tracerr::new!(E::SessionExpired));
        }

        self.check_user_exists(session.user_id).await?;

        let (tokens, renewed) = codec
            .issue_pair(session.user_id, session.role, session.authenticated_at)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output::Renewed {
            session: renewed,
            tokens,
        })
    }
}

impl<Db> Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    /// Ensures the [`User`] a [`Session`] refers to still exists.
    async fn check_user_exists(
        &self,
        user_id: user::Id,
    ) -> Result<(), Traced<ExecutionError>> {
        use ExecutionError as E;

        self.database()
            .execute(Select(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Provided access [`session::Token`] is not authentic, and no refresh
    /// one is provided.
    #[display("Invalid token")]
    InvalidToken,

    /// Refresh [`session::Token`] is expired, invalid, or its renewal chain
    /// has outlived the allowed session age.
    #[display("Session expired")]
    SessionExpired,

    /// [`session::Token`] issuing error.
    #[display("Failed to issue a `Token`: {_0}")]
    Token(token::IssueError),

    /// No [`session::Token`] is provided at all.
    #[display("Token required")]
    TokenRequired,

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{testing, token, Command as _, Config, Service};

    use super::{AuthorizeUserSession, ExecutionError, Output};

    #[tokio::test]
    async fn authorizes_valid_access_token() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let (tokens, _) = service
            .config()
            .tokens
            .issue_pair(user.id, user.role, DateTime::now().coerce())
            .unwrap();

        let out = service
            .execute(AuthorizeUserSession {
                access_token: Some(tokens.access),
                refresh_token: None,
            })
            .await
            .unwrap();

        assert!(matches!(out, Output::Authorized(s) if s.user_id == user.id));
    }

    #[tokio::test]
    async fn renews_with_valid_refresh_token() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let expired = testing::expired_token(testing::SECRET, user.id);
        let (tokens, _) = service
            .config()
            .tokens
            .issue_pair(user.id, user.role, DateTime::now().coerce())
            .unwrap();

        let out = service
            .execute(AuthorizeUserSession {
                access_token: Some(expired),
                refresh_token: Some(tokens.refresh),
            })
            .await
            .unwrap();

        let Output::Renewed { session, tokens } = out else {
            panic!("expected a renewal");
        };
        assert_eq!(session.user_id, user.id);

        // The freshly issued access token must authorize as is.
        let verified =
            service.config().tokens.verify(&tokens.access).unwrap();
        assert_eq!(verified.user_id, user.id);
    }

    #[tokio::test]
    async fn renewal_preserves_authentication_time() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let authenticated_at =
            (DateTime::now() - Duration::from_secs(3600)).coerce();
        let (tokens, _) = service
            .config()
            .tokens
            .issue_pair(user.id, user.role, authenticated_at)
            .unwrap();

        let out = service
            .execute(AuthorizeUserSession {
                access_token: None,
                refresh_token: Some(tokens.refresh),
            })
            .await
            .unwrap();

        let Output::Renewed { session, .. } = out else {
            panic!("expected a renewal");
        };
        assert_eq!(
            session.authenticated_at.unix_timestamp(),
            authenticated_at.unix_timestamp(),
        );
    }

    #[tokio::test]
    async fn rejects_when_both_tokens_expired() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let res = service
            .execute(AuthorizeUserSession {
                access_token: Some(testing::expired_token(
                    testing::SECRET,
                    user.id,
                )),
                refresh_token: Some(testing::expired_token(
                    testing::SECRET,
                    user.id,
                )),
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::SessionExpired,
        ));
    }

    #[tokio::test]
    async fn requires_a_token() {
        let (service, _) = testing::service();

        let res = service
            .execute(AuthorizeUserSession {
                access_token: None,
                refresh_token: None,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::TokenRequired,
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_access_without_refresh() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let res = service
            .execute(AuthorizeUserSession {
                access_token: Some(testing::expired_token(
                    testing::SECRET,
                    user.id,
                )),
                refresh_token: None,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::InvalidToken,
        ));
    }

    #[tokio::test]
    async fn caps_the_renewal_chain_age() {
        let store = crate::testing::InMemory::default();
        let mut conf = token::Config::new(testing::SECRET);
        conf.max_session_age = Duration::from_secs(60);
        let service = Service::new(
            Config {
                tokens: token::Codec::new(&conf).unwrap(),
            },
            store.clone(),
        );

        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let authenticated_at =
            (DateTime::now() - Duration::from_secs(120)).coerce();
        let (tokens, _) = service
            .config()
            .tokens
            .issue_pair(user.id, user.role, authenticated_at)
            .unwrap();

        let res = service
            .execute(AuthorizeUserSession {
                access_token: None,
                refresh_token: Some(tokens.refresh),
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::SessionExpired,
        ));
    }

    #[tokio::test]
    async fn rejects_session_of_removed_user() {
        let (service, _) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");

        let (tokens, _) = service
            .config()
            .tokens
            .issue_pair(user.id, user.role, DateTime::now().coerce())
            .unwrap();

        let res = service
            .execute(AuthorizeUserSession {
                access_token: Some(tokens.access),
                refresh_token: None,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::UserNotExists(id) if *id == user.id,
        ));
    }
}
