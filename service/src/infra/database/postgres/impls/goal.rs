//! [`Goal`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, Goal},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Restores a [`Goal`] from the provided [`Row`].
fn from_row(row: &Row) -> Goal {
    Goal {
        user_id: row.get("user_id"),
        kind: row.get("kind"),
        target_weight: row.get("target_weight"),
        target_date: row.get("target_date"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Goal>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Goal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Goal>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let user_id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT user_id, kind, target_weight, target_date, created_at \
            FROM goals \
            WHERE user_id = $1::UUID \
            LIMIT 1";
        self.query_opt(SQL, &[&user_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<C> Database<Insert<Goal>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Goal>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(goal): Insert<Goal>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(goal)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Goal>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(goal): Update<Goal>,
    ) -> Result<Self::Ok, Self::Err> {
        let Goal {
            user_id,
            kind,
            target_weight,
            target_date,
            created_at,
        } = goal;

        const SQL: &str = "\
            INSERT INTO goals (\
                user_id, kind, target_weight, target_date, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::INT2, $3::FLOAT8, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ\
            ) \
            ON CONFLICT (user_id) DO UPDATE \
            SET kind = EXCLUDED.kind, \
                target_weight = EXCLUDED.target_weight, \
                target_date = EXCLUDED.target_date, \
                created_at = EXCLUDED.created_at";
        self.exec(
            SQL,
            &[&user_id, &kind, &target_weight, &target_date, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
