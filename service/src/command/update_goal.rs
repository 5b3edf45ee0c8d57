//! [`Command`] for updating a [`Goal`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Weight,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{goal, user, Goal, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating the existing [`Goal`] of a [`User`].
#[derive(Clone, Debug)]
pub struct UpdateGoal {
    /// ID of the [`User`] whose [`Goal`] is updated.
    pub user_id: user::Id,

    /// New [`goal::Kind`] of the [`Goal`].
    pub kind: goal::Kind,

    /// New target [`Weight`] of the [`Goal`], if any.
    pub target_weight: Option<Weight>,

    /// New [`goal::TargetDateTime`] of the [`Goal`].
    pub target_date: goal::TargetDateTime,
}

impl<Db> Command<UpdateGoal> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Goal>, user::Id>>,
            Ok = Option<Goal>,
            Err = Traced<database::Error>,
        > + Database<Update<Goal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Transacted<Db>:
        Database<Lock<By<User, user::Id>>, Err = Traced<database::Error>>,
{
    type Ok = Goal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateGoal) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateGoal {
            user_id,
            kind,
            target_weight,
            target_date,
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

        let mut goal = tx
            .execute(Select(By::<Option<Goal>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NoGoal(user_id))
            .map_err(tracerr::wrap!())?;

        goal.kind = kind;
        goal.target_weight = target_weight;
        goal.target_date = target_date;
        tx.execute(Update(goal.clone()))
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

/// Error of [`UpdateGoal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] has no [`Goal`] to update.
    #[display("`User(id: {_0})` has no `Goal`")]
    NoGoal(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Weight};

    use crate::{
        domain::{goal, user, Goal},
        testing, Command as _,
    };

    use super::{ExecutionError, UpdateGoal};

    fn cmd(user_id: user::Id, kind: goal::Kind) -> UpdateGoal {
        UpdateGoal {
            user_id,
            kind,
            target_weight: Weight::new(80.0),
            target_date: (DateTime::now()
                + Duration::from_secs(30 * 24 * 3600))
            .coerce(),
        }
    }

    #[tokio::test]
    async fn updates_existing_goal() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());
        store.put_goal(Goal {
            user_id: user.id,
            kind: goal::Kind::LoseWeight,
            target_weight: Weight::new(70.0),
            target_date: (DateTime::now()
                + Duration::from_secs(90 * 24 * 3600))
            .coerce(),
            created_at: DateTime::now().coerce(),
        });

        let goal = service
            .execute(cmd(user.id, goal::Kind::GainWeight))
            .await
            .unwrap();

        assert_eq!(goal.kind, goal::Kind::GainWeight);
        assert_eq!(goal.target_weight, Weight::new(80.0));
    }

    #[tokio::test]
    async fn rejects_update_without_goal() {
        let (service, store) = testing::service();
        let user = testing::user("Alice", "alice@example.com", "secret");
        store.put_user(user.clone());

        let res = service
            .execute(cmd(user.id, goal::Kind::MaintainWeight))
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            ExecutionError::NoGoal(id) if *id == user.id,
        ));
    }
}
