//! [`Command`] for an explicit [`Session`] renewal.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Session;
use crate::{
    domain::{
        user::{self, session},
        User,
    },
    infra::{database, Database},
    token, Service,
};

use super::Command;

/// [`Command`] for an explicit [`Session`] renewal by its refresh
/// [`session::Token`].
#[derive(Clone, Debug)]
pub struct RefreshUserSession {
    /// Refresh [`session::Token`] to renew the [`Session`] with.
    pub refresh_token: Option<session::Token>,
}

/// Output of [`RefreshUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Freshly issued [`session::TokenPair`].
    pub tokens: session::TokenPair,

    /// [`DateTime`] when the renewed access [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<RefreshUserSession> for Service<Db>
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
        cmd: RefreshUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let codec = &self.config().tokens;

        let token = cmd
            .refresh_token
            .ok_or(E::TokenRequired)
            .map_err(tracerr::wrap!())?;

        let session = codec
            .verify(&token)
            .map_err(|_| tracerr::new!(E::InvalidToken))?;

        let expires =
            session.authenticated_at.coerce() + codec.max_session_age();
        if DateTime::now() > expires {
            return Err(tracerr::new!(E::InvalidToken));
        }

        self.database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let (tokens, renewed) = codec
            .issue_pair(session.user_id, session.role, session.authenticated_at)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            tokens,
            expires_at: renewed.expires_at,
        })
    }
}

/// Error of [`RefreshUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Refresh [`session::Token`] is not authentic, expired, or its renewal
    /// chain has outlived the allowed session age.
    #[display("Invalid refresh token")]
    InvalidToken,

    /// [`session::Token`] issuing error.
    #[display("Failed to issue a `Token`: {_0}")]
    Token(token::IssueError),

    /// No refresh [`session::Token`] is provided.
    #[display("Token required")]
    TokenRequired,

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{testing, Command as _};

    use super::{ExecutionError, RefreshUserSession};

    #[tokio::test]
    async fn reissues_both_tokens() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let (tokens, _) = service
            .config()
            .tokens
            .issue_pair(user.id, user.role, DateTime::now().coerce())
            .unwrap();

        let out = service
            .execute(RefreshUserSession {
                refresh_token: Some(tokens.refresh),
            })
            .await
            .unwrap();

        let codec = &service.config().tokens;
        assert!(codec.verify(&out.tokens.access).is_ok());
        assert!(codec.verify(&out.tokens.refresh).is_ok());
    }

    #[tokio::test]
    async fn requires_a_token() {
        let (service, _) = testing::service();

        let res = service
            .execute(RefreshUserSession {
                refresh_token: None,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::TokenRequired,
        ));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let res = service
            .execute(RefreshUserSession {
                refresh_token: Some(testing::expired_token(
                    testing::SECRET,
                    user.id,
                )),
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::InvalidToken,
        ));
    }
}
