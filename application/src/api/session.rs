//! Session management REST handlers.
//!
//! These work with the raw session cookies directly, bypassing the
//! [`authorize`] middleware: a probe must not renew anything, and a refresh
//! must succeed even when the access token is long gone.
//!
//! [`authorize`]: crate::session::authorize

use axum::{Extension, Json};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use service::{
    command::{self, CheckUserSession, Command as _, RefreshUserSession},
    domain::user::session,
};

use crate::{
    define_error,
    session::{tokens, Cookies},
    AsError, Error,
};

/// Response of the [`check()`] handler.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Checked {
    /// Indicator that the session is still usable.
    pub valid: bool,
}

/// Probes whether the current session is still usable, without renewing
/// anything.
///
/// Succeeds if at least one of the provided tokens verifies.
pub async fn check(
    Extension(service): Extension<crate::Service>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
) -> Result<Json<Checked>, Error> {
    let (access_token, refresh_token) =
        tokens(&jar, auth.as_ref().map(|TypedHeader(a)| a));

    service
        .execute(CheckUserSession {
            access_token,
            refresh_token,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Checked { valid: true }))
}

/// Response of the [`refresh()`] handler.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Refreshed {
    /// Date and time the re-issued access token expires at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: session::ExpirationDateTime,
}

/// Explicitly re-issues both session tokens from a valid refresh one,
/// re-setting both session cookies.
pub async fn refresh(
    Extension(service): Extension<crate::Service>,
    Extension(cookies): Extension<Cookies>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Refreshed>), Error> {
    let (_, refresh_token) = tokens(&jar, None);

    let output = service
        .execute(RefreshUserSession { refresh_token })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        cookies.apply(jar, output.tokens),
        Json(Refreshed {
            expires_at: output.expires_at,
        }),
    ))
}

impl AsError for command::check_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SESSION_EXPIRED"]
                #[status = UNAUTHORIZED]
                #[message = "Session is expired, authenticate again"]
                SessionExpired,

                #[code = "TOKEN_REQUIRED"]
                #[status = UNAUTHORIZED]
                #[message = "Authentication token is required"]
                TokenRequired,
            }
        }

        match self {
            Self::SessionExpired => Some(Error::SessionExpired.into()),
            Self::TokenRequired => Some(Error::TokenRequired.into()),
        }
    }
}

impl AsError for command::refresh_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SESSION_EXPIRED"]
                #[status = UNAUTHORIZED]
                #[message = "Session is expired, authenticate again"]
                SessionExpired,

                #[code = "TOKEN_REQUIRED"]
                #[status = UNAUTHORIZED]
                #[message = "Authentication token is required"]
                TokenRequired,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Token(_) => None,
            Self::InvalidToken | Self::UserNotExists(_) => {
                Some(Error::SessionExpired.into())
            }
            Self::TokenRequired => Some(Error::TokenRequired.into()),
        }
    }
}
