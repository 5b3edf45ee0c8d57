//! `Progress`-related REST handlers.

use axum::{extract::Path, Extension, Json};
use common::Weight;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _, DeleteProgress, RecordDailyProgress},
    domain::{self, progress},
    query,
};

use crate::{define_error, session::CurrentSession, AsError, Error};

/// Representation of a [`domain::Progress`] in API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// ID of the [`domain::Progress`] record.
    id: progress::Id,

    /// Measured [`Weight`], in kilograms.
    weight: Weight,

    /// Consumed calories, if reported.
    calories: Option<progress::Calories>,

    /// Date and time the [`domain::Progress`] was recorded at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    recorded_at: progress::RecordingDateTime,
}

impl From<domain::Progress> for Progress {
    fn from(progress: domain::Progress) -> Self {
        Self {
            id: progress.id,
            weight: progress.weight,
            calories: progress.calories,
            recorded_at: progress.recorded_at,
        }
    }
}

/// Request body of the [`record()`] handler.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Record {
    /// Measured weight, in kilograms.
    pub weight: f64,

    /// Consumed calories, if reported.
    pub calories: Option<i32>,
}

define_error! {
    enum ValidationError {
        #[code = "INVALID_WEIGHT"]
        #[status = BAD_REQUEST]
        #[message = "Provided `weight` is not a valid `Weight`"]
        Weight,

        #[code = "INVALID_CALORIES"]
        #[status = BAD_REQUEST]
        #[message = "Provided `calories` must be a non-negative number"]
        Calories,
    }
}

/// Records the daily `Progress` of the authenticated `User`.
///
/// At most one `Progress` record exists per UTC calendar day: recording again
/// on the same day overwrites the existing record. Responds with `201` when a
/// new record is created, and `200` when the day's one is overwritten.
pub async fn record(
    Extension(service): Extension<crate::Service>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<Record>,
) -> Result<(http::StatusCode, Json<Progress>), Error> {
    let weight = Weight::new(body.weight)
        .ok_or_else(|| Error::from(ValidationError::Weight))?;
    let calories = body
        .calories
        .map(|value| {
            progress::Calories::new(value)
                .ok_or_else(|| Error::from(ValidationError::Calories))
        })
        .transpose()?;

    let output = service
        .execute(RecordDailyProgress {
            user_id: session.user_id,
            weight,
            calories,
        })
        .await
        .map_err(AsError::into_error)?;

    let status = if output.created {
        http::StatusCode::CREATED
    } else {
        http::StatusCode::OK
    };

    Ok((status, Json(output.progress.into())))
}

/// Lists all the `Progress` records of the authenticated `User`, most recent
/// first.
pub async fn list(
    Extension(service): Extension<crate::Service>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<Progress>>, Error> {
    let records = service
        .execute(query::progress::ListByUser::by(session.user_id))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

/// Deletes a `Progress` record of the authenticated `User`, re-syncing their
/// current weight to the latest remaining record.
pub async fn remove(
    Extension(service): Extension<crate::Service>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<progress::Id>,
) -> Result<http::StatusCode, Error> {
    service
        .execute(DeleteProgress {
            user_id: session.user_id,
            progress_id: id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(http::StatusCode::NO_CONTENT)
}

impl AsError for command::record_daily_progress::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NO_GOAL"]
                #[status = BAD_REQUEST]
                #[message = "A `Goal` must be set before recording `Progress`"]
                NoGoal,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NoGoal(_) => Some(Error::NoGoal.into()),
            Self::UserNotExists(_) => Some(Error::UserNotExists.into()),
        }
    }
}

impl AsError for command::delete_progress::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PROGRESS_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Progress` record with the provided ID does not \
                             exist"]
                NotFound,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotFound(_) => Some(Error::NotFound.into()),
            Self::UserNotExists(_) => Some(Error::UserNotExists.into()),
        }
    }
}
