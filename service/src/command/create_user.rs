//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name, Password};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            email,
            password,
        } = cmd;

        let u = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let user = User {
            id: user::Id::new(),
            name,
            email,
            password_hash: user::PasswordHash::new(password.expose_secret()),
            role: user::Role::User,
            current_weight: None,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{testing, Command as _};

    use super::{CreateUser, ExecutionError};

    fn cmd(name: &str, email: &str, password: &str) -> CreateUser {
        CreateUser {
            name: name.parse().unwrap(),
            email: email.parse().unwrap(),
            password: SecretBox::new(Box::new(password.parse().unwrap())),
        }
    }

    #[tokio::test]
    async fn creates_user_with_hashed_password() {
        let (service, store) = testing::service();

        let user = service
            .execute(cmd("Alice", "alice@example.com", "secret"))
            .await
            .unwrap();

        assert!(user.password_hash.verify(&"secret".into()));
        assert!(!user.password_hash.verify(&"wrong".into()));
        assert!(user.current_weight.is_none());
        assert!(store.get_user(user.id).is_some());
    }

    #[tokio::test]
    async fn rejects_occupied_email() {
        let (service, _) = testing::service();

        drop(
            service
                .execute(cmd("Alice", "alice@example.com", "secret"))
                .await
                .unwrap(),
        );
        let res = service
            .execute(cmd("Mallory", "alice@example.com", "hunter2"))
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::EmailOccupied(_),
        ));
    }
}
