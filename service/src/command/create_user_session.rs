//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::TokenPair, Email, Password, Session};
use crate::{
    domain::{
        user::{self, session},
        User,
    },
    infra::{database, Database},
    token, Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Clone, Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// [`Email`] of a [`User`].
        email: user::Email,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] by [`User`] ID.
    ByUserId(user::Id),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`TokenPair`] of the created [`Session`].
    pub tokens: session::TokenPair,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,

    /// [`DateTime`] when the access [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { email, password } => {
                let user = self
                    .database()
                    .execute(Select(By::new(&email)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;

                if !user.password_hash.verify(password.expose_secret()) {
                    return Err(tracerr::new!(E::WrongCredentials));
                }

                user
            }
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        };

        let (tokens, session) = self
            .config()
            .tokens
            .issue_pair(user.id, user.role, DateTime::now().coerce())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            tokens,
            user,
            expires_at: session.expires_at,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`session::Token`] issuing error.
    #[display("Failed to issue a `Token`: {_0}")]
    Token(token::IssueError),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{testing, Command as _};

    use super::{CreateUserSession, ExecutionError};

    #[tokio::test]
    async fn issues_verifiable_token_pair() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let out = service
            .execute(CreateUserSession::ByCredentials {
                email: "alice@example.com".parse().unwrap(),
                password: SecretBox::new(Box::new("secret".into())),
            })
            .await
            .unwrap();

        let codec = &service.config().tokens;
        let access = codec.verify(&out.tokens.access).unwrap();
        let refresh = codec.verify(&out.tokens.refresh).unwrap();
        assert_eq!(access.user_id, user.id);
        assert_eq!(refresh.user_id, user.id);
        assert!(refresh.expires_at > access.expires_at);
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let (service, store) = testing::service();
        store.put_user(testing::user("Alice", "alice@example.com", "secret"));

        let res = service
            .execute(CreateUserSession::ByCredentials {
                email: "alice@example.com".parse().unwrap(),
                password: SecretBox::new(Box::new("wrong".into())),
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::WrongCredentials,
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_email() {
        let (service, _) = testing::service();

        let res = service
            .execute(CreateUserSession::ByCredentials {
                email: "nobody@example.com".parse().unwrap(),
                password: SecretBox::new(Box::new("secret".into())),
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::WrongCredentials,
        ));
    }
}
