//! [`Command`] for recording a daily [`Progress`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime, Weight,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{progress, user, Goal, Progress, User},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for recording a daily [`Progress`] of a [`User`].
///
/// Upserts the [`Progress`] of the current UTC day and keeps the
/// [`User::current_weight`] in sync with it, atomically.
#[derive(Clone, Debug)]
pub struct RecordDailyProgress {
    /// ID of the [`User`] to record a [`Progress`] for.
    pub user_id: user::Id,

    /// Measured [`Weight`].
    pub weight: Weight,

    /// Consumed [`progress::Calories`], if reported.
    pub calories: Option<progress::Calories>,
}

/// Output of [`RecordDailyProgress`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Recorded [`Progress`].
    pub progress: Progress,

    /// Indicator whether the [`Progress`] was created rather than updated.
    pub created: bool,
}

impl<Db> Command<RecordDailyProgress> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Goal>, user::Id>>,
            Ok = Option<Goal>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Progress>, read::progress::ForDay>>,
            Ok = Option<Progress>,
            Err = Traced<database::Error>,
        > + Database<Insert<Progress>, Err = Traced<database::Error>>
        + Database<Update<Progress>, Err = Traced<database::Error>>
        + Database<Update<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Transacted<Db>:
        Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordDailyProgress,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordDailyProgress {
            user_id,
            weight,
            calories,
        } = cmd;

        let now = DateTime::now();

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

        tx.execute(Select(By::<Option<Goal>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NoGoal(user_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        let existing = tx
            .execute(Select(By::<Option<Progress>, _>::new(
                read::progress::ForDay {
                    user_id,
                    range: read::progress::DayRange::containing(now),
                },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let (progress, created) = match existing {
            Some(mut progress) => {
                progress.weight = weight;
                progress.calories = calories;
                progress.recorded_at = now.coerce();
                tx.execute(Update(progress.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                (progress, false)
            }
            None => {
                let progress = Progress {
                    id: progress::Id::new(),
                    user_id,
                    weight,
                    calories,
                    recorded_at: now.coerce(),
                };
                tx.execute(Insert(progress.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                (progress, true)
            }
        };

        user.current_weight = Some(weight);
        tx.execute(Update(user))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output { progress, created })
    }
}

/// Error of [`RecordDailyProgress`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] has no [`Goal`] to track a [`Progress`] against.
    #[display("`User(id: {_0})` has no `Goal`")]
    NoGoal(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Weight};

    use crate::{
        domain::{goal, progress, Goal},
        testing, Command as _,
    };

    use super::{ExecutionError, RecordDailyProgress};

    fn goal_of(user_id: crate::domain::user::Id) -> Goal {
        Goal {
            user_id,
            kind: goal::Kind::LoseWeight,
            target_weight: Weight::new(70.0),
            target_date: (DateTime::now()
                + Duration::from_secs(90 * 24 * 3600))
            .coerce(),
            created_at: DateTime::now().coerce(),
        }
    }

    #[tokio::test]
    async fn requires_a_goal() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let res = service
            .execute(RecordDailyProgress {
                user_id: user.id,
                weight: Weight::new(82.5).unwrap(),
                calories: None,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::NoGoal(id) if *id == user.id,
        ));
    }

    #[tokio::test]
    async fn creates_record_and_syncs_weight() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());
        store.put_goal(goal_of(user.id));

        let out = service
            .execute(RecordDailyProgress {
                user_id: user.id,
                weight: Weight::new(82.5).unwrap(),
                calories: progress::Calories::new(2100),
            })
            .await
            .unwrap();

        assert!(out.created);
        assert_eq!(store.progresses_of(user.id).len(), 1);
        assert_eq!(
            store.get_user(user.id).unwrap().current_weight,
            Weight::new(82.5),
        );
    }

    #[tokio::test]
    async fn updates_same_day_record_in_place() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());
        store.put_goal(goal_of(user.id));

        let first = service
            .execute(RecordDailyProgress {
                user_id: user.id,
                weight: Weight::new(82.5).unwrap(),
                calories: None,
            })
            .await
            .unwrap();
        let second = service
            .execute(RecordDailyProgress {
                user_id: user.id,
                weight: Weight::new(81.9).unwrap(),
                calories: progress::Calories::new(1900),
            })
            .await
            .unwrap();

        assert!(!second.created);
        assert_eq!(second.progress.id, first.progress.id);
        assert_eq!(store.progresses_of(user.id).len(), 1);
        assert_eq!(
            store.get_user(user.id).unwrap().current_weight,
            Weight::new(81.9),
        );
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let (service, store) = testing::service();
        let user_id = crate::domain::user::Id::new();
        store.put_goal(goal_of(user_id));

        let res = service
            .execute(RecordDailyProgress {
                user_id,
                weight: Weight::new(82.5).unwrap(),
                calories: None,
            })
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::UserNotExists(_),
        ));
    }
}
