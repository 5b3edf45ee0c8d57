//! [`Command`] for deleting a [`Progress`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{progress, user, Progress, User},
    infra::{database, Database},
    read::progress::Latest,
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Progress`] of a [`User`].
///
/// Re-syncs the [`User::current_weight`] with the latest remaining
/// [`Progress`] in the same transaction. If no [`Progress`] records remain,
/// the [`User::current_weight`] keeps its last known value.
#[derive(Clone, Copy, Debug)]
pub struct DeleteProgress {
    /// ID of the [`User`] the [`Progress`] belongs to.
    pub user_id: user::Id,

    /// ID of the [`Progress`] to delete.
    pub progress_id: progress::Id,
}

impl<Db> Command<DeleteProgress> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Delete<By<Progress, (user::Id, progress::Id)>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Latest<Progress>>, user::Id>>,
            Ok = Option<Latest<Progress>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Update<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Transacted<Db>:
        Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProgress,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProgress {
            user_id,
            progress_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `User`.
        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let deleted = tx
            .execute(Delete(By::<Progress, _>::new((user_id, progress_id))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !deleted {
            return Err(tracerr::new!(E::NotFound(progress_id)));
        }

        let latest = tx
            .execute(Select(By::<Option<Latest<Progress>>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(Latest(progress)) = latest {
            let mut user = tx
                .execute(Select(By::<Option<User>, _>::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?;
            user.current_weight = Some(progress.weight);
            tx.execute(Update(user))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(())
    }
}

/// Error of [`DeleteProgress`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Progress`] with the provided ID does not exist, or belongs to
    /// another [`User`].
    #[display("`Progress(id: {_0})` does not exist")]
    NotFound(#[error(not(source))] progress::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Weight};

    use crate::{
        domain::{progress, Progress},
        testing, Command as _,
    };

    use super::{DeleteProgress, ExecutionError};

    fn record(
        user_id: crate::domain::user::Id,
        weight: f64,
        days_ago: u64,
    ) -> Progress {
        Progress {
            id: progress::Id::new(),
            user_id,
            weight: Weight::new(weight).unwrap(),
            calories: None,
            recorded_at: (DateTime::now()
                - Duration::from_secs(days_ago * 24 * 3600))
            .coerce(),
        }
    }

    #[tokio::test]
    async fn resyncs_weight_to_remaining_latest() {
        let (service, store) = testing::service();
        let mut user = testing::user("Alice", "alice@example.com", "secret");
        user.current_weight = Weight::new(81.0);
        store.put_user(user.clone());

        let older = record(user.id, 83.0, 2);
        let newer = record(user.id, 81.0, 0);
        store.put_progress(older.clone());
        store.put_progress(newer.clone());

        service
            .execute(DeleteProgress {
                user_id: user.id,
                progress_id: newer.id,
            })
            .await
            .unwrap();

        assert_eq!(store.progresses_of(user.id).len(), 1);
        assert_eq!(
            store.get_user(user.id).unwrap().current_weight,
            Weight::new(83.0),
        );
    }

    #[tokio::test]
    async fn keeps_last_weight_when_no_records_remain() {
        let (service, store) = testing::service();
        let mut user = testing::user("Alice", "alice@example.com", "secret");
        user.current_weight = Weight::new(81.0);
        store.put_user(user.clone());

        let only = record(user.id, 81.0, 0);
        store.put_progress(only.clone());

        service
            .execute(DeleteProgress {
                user_id: user.id,
                progress_id: only.id,
            })
            .await
            .unwrap();

        assert!(store.progresses_of(user.id).is_empty());
        assert_eq!(
            store.get_user(user.id).unwrap().current_weight,
            Weight::new(81.0),
        );
    }

    #[tokio::test]
    async fn rejects_unknown_record() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let res = service
            .execute(DeleteProgress {
                user_id: user.id,
                progress_id: progress::Id::new(),
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::NotFound(_),
        ));
    }

    #[tokio::test]
    async fn rejects_foreign_record() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        let other = testing::user("Bob", "bob@example.com", "secret");
        store.put_user(user.clone());
        store.put_user(other.clone());

        let foreign = record(other.id, 90.0, 0);
        store.put_progress(foreign.clone());

        let res = service
            .execute(DeleteProgress {
                user_id: user.id,
                progress_id: foreign.id,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::NotFound(_),
        ));
        assert_eq!(store.progresses_of(other.id).len(), 1);
    }
}
