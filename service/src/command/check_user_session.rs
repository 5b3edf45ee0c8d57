//! [`Command`] for probing a [`Session`].

use derive_more::{Display, Error};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Session;
use crate::{domain::user::session, Service};

use super::Command;

/// [`Command`] for probing whether a [`Session`] is still alive.
///
/// Succeeds if at least one of the provided [`session::Token`]s verifies.
/// Never issues new [`session::Token`]s and never touches the database.
#[derive(Clone, Debug)]
pub struct CheckUserSession {
    /// Access [`session::Token`] to probe.
    pub access_token: Option<session::Token>,

    /// Refresh [`session::Token`] to probe.
    pub refresh_token: Option<session::Token>,
}

impl<Db> Command<CheckUserSession> for Service<Db> {
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CheckUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CheckUserSession {
            access_token,
            refresh_token,
        } = cmd;

        if access_token.is_none() && refresh_token.is_none() {
            return Err(tracerr::new!(E::TokenRequired));
        }

        let codec = &self.config().tokens;
        let alive = [access_token, refresh_token]
            .iter()
            .flatten()
            .any(|token| codec.verify(token).is_ok());

        alive
            .then_some(())
            .ok_or(E::SessionExpired)
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`CheckUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error)]
pub enum ExecutionError {
    /// None of the provided [`session::Token`]s verify.
    #[display("Session expired")]
    SessionExpired,

    /// No [`session::Token`] is provided at all.
    #[display("Token required")]
    TokenRequired,
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{domain::user, testing, Command as _};

    use super::{CheckUserSession, ExecutionError};

    #[tokio::test]
    async fn requires_a_token() {
        let (service, _) = testing::service();

        let res = service
            .execute(CheckUserSession {
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
    async fn accepts_any_verifiable_token() {
        let (service, _) = testing::service();
        let user_id = user::Id::new();

        let (tokens, _) = service
            .config()
            .tokens
            .issue_pair(user_id, user::Role::User, DateTime::now().coerce())
            .unwrap();

        service
            .execute(CheckUserSession {
                access_token: Some(testing::expired_token(
                    testing::SECRET,
                    user_id,
                )),
                refresh_token: Some(tokens.refresh),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_when_all_tokens_expired() {
        let (service, _) = testing::service();
        let user_id = user::Id::new();

        let res = service
            .execute(CheckUserSession {
                access_token: Some(testing::expired_token(
                    testing::SECRET,
                    user_id,
                )),
                refresh_token: None,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::SessionExpired,
        ));
    }
}
