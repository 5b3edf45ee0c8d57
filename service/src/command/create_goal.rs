//! [`Command`] for creating a [`Goal`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Weight,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{goal, user, Goal, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Goal`] of a [`User`].
///
/// A [`User`] may have at most one [`Goal`], so creation fails if one exists
/// already.
#[derive(Clone, Debug)]
pub struct CreateGoal {
    /// ID of the [`User`] to create a [`Goal`] for.
    pub user_id: user::Id,

    /// [`goal::Kind`] of a new [`Goal`].
    pub kind: goal::Kind,

    /// Target [`Weight`] of a new [`Goal`], if any.
    pub target_weight: Option<Weight>,

    /// [`goal::TargetDateTime`] of a new [`Goal`].
    pub target_date: goal::TargetDateTime,
}

impl<Db> Command<CreateGoal> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Goal>, user::Id>>,
            Ok = Option<Goal>,
            Err = Traced<database::Error>,
        > + Database<Insert<Goal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Transacted<Db>:
        Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>,
{
    type Ok = Goal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateGoal) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateGoal {
            user_id,
            kind,
            target_weight,
            target_date,
        } = cmd;

        self.database()
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

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

        let existing = tx
            .execute(Select(By::<Option<Goal>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::GoalAlreadyExists(user_id)));
        }

        let goal = Goal {
            user_id,
            kind,
            target_weight,
            target_date,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(goal.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(goal)
    }
}

/// Error of [`CreateGoal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] already has a [`Goal`].
    #[display("`User(id: {_0})` already has a `Goal`")]
    GoalAlreadyExists(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Weight};

    use crate::{
        domain::{goal, user},
        testing, Command as _,
    };

    use super::{CreateGoal, ExecutionError};

    fn cmd(user_id: user::Id) -> CreateGoal {
        CreateGoal {
            user_id,
            kind: goal::Kind::LoseWeight,
            target_weight: Weight::new(70.0),
            target_date: (DateTime::now()
                + Duration::from_secs(90 * 24 * 3600))
            .coerce(),
        }
    }

    #[tokio::test]
    async fn creates_single_goal() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let goal = service.execute(cmd(user.id)).await.unwrap();
        assert_eq!(goal.user_id, user.id);
        assert_eq!(goal.kind, goal::Kind::LoseWeight);
    }

    #[tokio::test]
    async fn rejects_second_goal() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        drop(service.execute(cmd(user.id)).await.unwrap());
        let res = service.execute(cmd(user.id)).await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::GoalAlreadyExists(id) if *id == user.id,
        ));
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let (service, _) = testing::service();

        let res = service.execute(cmd(user::Id::new())).await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::UserNotExists(_),
        ));
    }
}
