//! Testing fixtures.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{
        progress,
        user::{self, session::Token, Session},
        Goal, Progress, User,
    },
    infra::{database, Database},
    read::{self, progress::Latest},
    token, Config, Service,
};

/// Secret used for signing session tokens in tests.
pub(crate) const SECRET: &str = "test-secret-0123456789abcdef";

/// Creates a [`token::Codec`] signing with the [`SECRET`].
pub(crate) fn codec() -> token::Codec {
    token::Codec::new(&token::Config::new(SECRET)).unwrap()
}

/// Creates a [`Service`] backed by an empty [`InMemory`] store.
pub(crate) fn service() -> (Service<InMemory>, InMemory) {
    let store = InMemory::default();
    (
        Service::new(
            Config {
                tokens: codec(),
            },
            store.clone(),
        ),
        store,
    )
}

/// Creates a [`User`] with the provided `name`, hashing the `password`.
pub(crate) fn user(name: &str, email: &str, password: &str) -> User {
    User {
        id: user::Id::new(),
        name: name.parse().unwrap(),
        email: email.parse().unwrap(),
        password_hash: user::PasswordHash::new(&password.into()),
        role: user::Role::User,
        current_weight: None,
        created_at: DateTime::now().coerce(),
    }
}

/// Signs a [`Token`] for the provided [`user::Id`] that expired an hour ago.
pub(crate) fn expired_token(secret: &str, user_id: user::Id) -> Token {
    token_expired_for(secret, user_id, Duration::from_secs(3600))
}

/// Signs a [`Token`] for the provided [`user::Id`] whose expiration passed
/// the given [`Duration`] `ago`.
pub(crate) fn token_expired_for(
    secret: &str,
    user_id: user::Id,
    ago: Duration,
) -> Token {
    let issued_at = DateTime::now() - Duration::from_secs(3600) - ago;
    let encoded = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Session {
            user_id,
            role: user::Role::User,
            issued_at: issued_at.coerce(),
            expires_at: (issued_at + Duration::from_secs(3600)).coerce(),
            authenticated_at: issued_at.coerce(),
        },
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    // SAFETY: `jsonwebtoken::encode` always returns a valid `Token`.
    #[expect(unsafe_code, reason = "invariants are preserved")]
    unsafe {
        Token::new_unchecked(encoded)
    }
}

/// In-memory [`Database`] exercising commands without Postgres.
///
/// Transactions are not isolated: every operation applies directly to the
/// shared state.
#[derive(Clone, Debug, Default)]
pub(crate) struct InMemory {
    /// Shared state of this store.
    state: Arc<Mutex<State>>,
}

/// State of an [`InMemory`] store.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Goal`]s, keyed by the owning [`user::Id`].
    goals: HashMap<user::Id, Goal>,

    /// Stored [`Progress`]es.
    progresses: HashMap<progress::Id, Progress>,
}

impl InMemory {
    /// Puts the provided [`User`] into this store.
    pub(crate) fn put_user(&self, user: User) {
        drop(self.state.lock().unwrap().users.insert(user.id, user));
    }

    /// Returns the [`User`] with the provided [`user::Id`], if any.
    pub(crate) fn get_user(&self, id: user::Id) -> Option<User> {
        self.state.lock().unwrap().users.get(&id).cloned()
    }

    /// Puts the provided [`Goal`] into this store.
    pub(crate) fn put_goal(&self, goal: Goal) {
        drop(self.state.lock().unwrap().goals.insert(goal.user_id, goal));
    }

    /// Puts the provided [`Progress`] into this store.
    pub(crate) fn put_progress(&self, progress: Progress) {
        drop(
            self.state
                .lock()
                .unwrap()
                .progresses
                .insert(progress.id, progress),
        );
    }

    /// Returns all stored [`Progress`]es of the [`User`] with the provided
    /// [`user::Id`].
    pub(crate) fn progresses_of(&self, id: user::Id) -> Vec<Progress> {
        self.state
            .lock()
            .unwrap()
            .progresses
            .values()
            .filter(|p| p.user_id == id)
            .cloned()
            .collect()
    }
}

impl Database<Transact> for InMemory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<User, user::Id>>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for InMemory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.get_user(by.into_inner()))
    }
}

impl<'e> Database<Select<By<Option<User>, &'e user::Email>>> for InMemory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }
}

impl Database<Select<By<Vec<User>, ()>>> for InMemory {
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<User>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state.lock().unwrap().users.values().cloned().collect())
    }
}

impl Database<Insert<User>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.put_user(user);
        Ok(())
    }
}

impl Database<Update<User>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.put_user(user);
        Ok(())
    }
}

impl Database<Select<By<Option<Goal>, user::Id>>> for InMemory {
    type Ok = Option<Goal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Goal>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .goals
            .get(&by.into_inner())
            .cloned())
    }
}

impl Database<Insert<Goal>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(goal): Insert<Goal>,
    ) -> Result<Self::Ok, Self::Err> {
        self.put_goal(goal);
        Ok(())
    }
}

impl Database<Update<Goal>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(goal): Update<Goal>,
    ) -> Result<Self::Ok, Self::Err> {
        self.put_goal(goal);
        Ok(())
    }
}

impl Database<Select<By<Option<Progress>, read::progress::ForDay>>>
    for InMemory
{
    type Ok = Option<Progress>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Progress>, read::progress::ForDay>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::progress::ForDay { user_id, range } = by.into_inner();
        Ok(self
            .state
            .lock()
            .unwrap()
            .progresses
            .values()
            .find(|p| {
                p.user_id == user_id
                    && p.recorded_at >= range.start
                    && p.recorded_at <= range.end
            })
            .cloned())
    }
}

impl Database<Select<By<Option<Latest<Progress>>, user::Id>>> for InMemory {
    type Ok = Option<Latest<Progress>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Latest<Progress>>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let user_id = by.into_inner();
        Ok(self
            .state
            .lock()
            .unwrap()
            .progresses
            .values()
            .filter(|p| p.user_id == user_id)
            .max_by_key(|p| p.recorded_at)
            .cloned()
            .map(Latest))
    }
}

impl Database<Select<By<Vec<Progress>, user::Id>>> for InMemory {
    type Ok = Vec<Progress>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Progress>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut list = self.progresses_of(by.into_inner());
        list.sort_by_key(|p| std::cmp::Reverse(p.recorded_at));
        Ok(list)
    }
}

impl Database<Insert<Progress>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(progress): Insert<Progress>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            self.state
                .lock()
                .unwrap()
                .progresses
                .insert(progress.id, progress),
        );
        Ok(())
    }
}

impl Database<Update<Progress>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(progress): Update<Progress>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            self.state
                .lock()
                .unwrap()
                .progresses
                .insert(progress.id, progress),
        );
        Ok(())
    }
}

impl Database<Delete<By<Progress, (user::Id, progress::Id)>>> for InMemory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Progress, (user::Id, progress::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (user_id, id) = by.into_inner();
        let mut state = self.state.lock().unwrap();
        let matches = state
            .progresses
            .get(&id)
            .is_some_and(|p| p.user_id == user_id);
        if matches {
            drop(state.progresses.remove(&id));
        }
        Ok(matches)
    }
}
