//! [`Progress`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{progress, user, Progress},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, progress::Latest},
};

/// Columns of a [`Progress`] row, in the `SELECT` order.
const COLUMNS: &str = "id, user_id, weight, calories, recorded_at";

/// Restores a [`Progress`] from the provided [`Row`].
fn from_row(row: &Row) -> Progress {
    Progress {
        id: row.get("id"),
        user_id: row.get("user_id"),
        weight: row.get("weight"),
        calories: row.get("calories"),
        recorded_at: row.get("recorded_at"),
    }
}

impl<C> Database<Select<By<Option<Progress>, read::progress::ForDay>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Progress>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Progress>, read::progress::ForDay>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::progress::ForDay { user_id, range } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM progress \
             WHERE user_id = $1::UUID \
               AND recorded_at BETWEEN $2::TIMESTAMPTZ \
                                   AND $3::TIMESTAMPTZ \
             LIMIT 1",
        );
        self.query_opt(&sql, &[&user_id, &range.start, &range.end])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row))
    }
}

impl<C> Database<Select<By<Option<Latest<Progress>>, user::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Latest<Progress>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Latest<Progress>>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let user_id: user::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM progress \
             WHERE user_id = $1::UUID \
             ORDER BY recorded_at DESC \
             LIMIT 1",
        );
        self.query_opt(&sql, &[&user_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(from_row).map(Latest))
    }
}

impl<C> Database<Select<By<Vec<Progress>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Progress>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Progress>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let user_id: user::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM progress \
             WHERE user_id = $1::UUID \
             ORDER BY recorded_at DESC",
        );
        Ok(self
            .query(&sql, &[&user_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Progress>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Progress>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(progress): Insert<Progress>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(progress))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Progress>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(progress): Update<Progress>,
    ) -> Result<Self::Ok, Self::Err> {
        let Progress {
            id,
            user_id,
            weight,
            calories,
            recorded_at,
        } = progress;

        const SQL: &str = "\
            INSERT INTO progress (\
                id, user_id, weight, calories, recorded_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::FLOAT8, $4::INT4, $5::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET weight = EXCLUDED.weight, \
                calories = EXCLUDED.calories, \
                recorded_at = EXCLUDED.recorded_at";
        self.exec(SQL, &[&id, &user_id, &weight, &calories, &recorded_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Progress, (user::Id, progress::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Progress, (user::Id, progress::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (user_id, id) = by.into_inner();

        const SQL: &str = "\
            DELETE FROM progress \
            WHERE id = $1::UUID \
              AND user_id = $2::UUID";
        self.exec(SQL, &[&id, &user_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|affected| affected > 0)
    }
}
