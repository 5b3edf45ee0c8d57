//! `Goal`-related REST handlers.

use axum::{Extension, Json};
use common::Weight;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _, CreateGoal, UpdateGoal},
    domain::{self, goal},
    query,
};

use crate::{define_error, session::CurrentSession, AsError, Error};

/// Representation of a [`domain::Goal`] in API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// Kind of the [`domain::Goal`].
    kind: String,

    /// Target [`Weight`] of the [`domain::Goal`], in kilograms.
    target_weight: Option<Weight>,

    /// Date and time the [`domain::Goal`] is aimed to be reached by.
    #[serde(with = "common::datetime::serde::rfc3339")]
    target_date: goal::TargetDateTime,

    /// Date and time the [`domain::Goal`] was set at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    created_at: goal::CreationDateTime,
}

impl From<domain::Goal> for Goal {
    fn from(goal: domain::Goal) -> Self {
        Self {
            kind: goal.kind.to_string(),
            target_weight: goal.target_weight,
            target_date: goal.target_date,
            created_at: goal.created_at,
        }
    }
}

/// Request body of the [`create()`] and [`update()`] handlers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalInput {
    /// Kind of the `Goal`.
    pub kind: String,

    /// Target weight of the `Goal`, in kilograms.
    pub target_weight: Option<f64>,

    /// Date and time the `Goal` is aimed to be reached by, as an RFC 3339
    /// string.
    pub target_date: String,
}

define_error! {
    enum ValidationError {
        #[code = "INVALID_GOAL_KIND"]
        #[status = BAD_REQUEST]
        #[message = "Provided `kind` is not a valid `GoalKind`"]
        Kind,

        #[code = "INVALID_WEIGHT"]
        #[status = BAD_REQUEST]
        #[message = "Provided `targetWeight` is not a valid `Weight`"]
        Weight,

        #[code = "INVALID_DATE"]
        #[status = BAD_REQUEST]
        #[message = "Provided `targetDate` is not a valid RFC 3339 date"]
        Date,
    }
}

define_error! {
    enum LookupError {
        #[code = "NO_GOAL"]
        #[status = NOT_FOUND]
        #[message = "Authenticated `User` has no `Goal` yet"]
        NoGoal,
    }
}

impl GoalInput {
    /// Parses this [`GoalInput`] into its domain parts.
    fn parse(
        self,
    ) -> Result<(goal::Kind, Option<Weight>, goal::TargetDateTime), Error> {
        let kind = self
            .kind
            .parse::<goal::Kind>()
            .map_err(|_| Error::from(ValidationError::Kind))?;
        let target_weight = self
            .target_weight
            .map(|kg| {
                Weight::new(kg).ok_or_else(|| Error::from(ValidationError::Weight))
            })
            .transpose()?;
        let target_date = goal::TargetDateTime::from_rfc3339(&self.target_date)
            .map_err(|_| Error::from(ValidationError::Date))?;

        Ok((kind, target_weight, target_date))
    }
}

/// Sets a new `Goal` for the authenticated `User`.
///
/// A `User` may have a single `Goal` only.
pub async fn create(
    Extension(service): Extension<crate::Service>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<GoalInput>,
) -> Result<(http::StatusCode, Json<Goal>), Error> {
    let (kind, target_weight, target_date) = body.parse()?;

    let goal = service
        .execute(CreateGoal {
            user_id: session.user_id,
            kind,
            target_weight,
            target_date,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((http::StatusCode::CREATED, Json(goal.into())))
}

/// Updates the existing `Goal` of the authenticated `User`.
pub async fn update(
    Extension(service): Extension<crate::Service>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<GoalInput>,
) -> Result<Json<Goal>, Error> {
    let (kind, target_weight, target_date) = body.parse()?;

    let goal = service
        .execute(UpdateGoal {
            user_id: session.user_id,
            kind,
            target_weight,
            target_date,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(goal.into()))
}

/// Returns the `Goal` of the authenticated `User`.
pub async fn fetch(
    Extension(service): Extension<crate::Service>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Goal>, Error> {
    service
        .execute(query::goal::ByUserId::by(session.user_id))
        .await
        .map_err(AsError::into_error)?
        .map(|goal| Json(goal.into()))
        .ok_or_else(|| LookupError::NoGoal.into())
}

impl AsError for command::create_goal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "GOAL_ALREADY_EXISTS"]
                #[status = CONFLICT]
                #[message = "`User` already has a `Goal`, update it instead"]
                GoalAlreadyExists,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::GoalAlreadyExists(_) => Some(Error::GoalAlreadyExists.into()),
            Self::UserNotExists(_) => Some(Error::UserNotExists.into()),
        }
    }
}

impl AsError for command::update_goal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NoGoal(_) => Some(LookupError::NoGoal.into()),
        }
    }
}
