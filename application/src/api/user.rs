//! `User`-related REST handlers.

use axum::{extract::Path, Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use common::Weight;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _, CreateUser, CreateUserSession},
    domain::{self, user},
    query,
};

use crate::{define_error, session::Cookies, AsError, Error};

/// Representation of a [`domain::User`] in API responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// ID of the [`domain::User`].
    id: user::Id,

    /// Name of the [`domain::User`].
    name: String,

    /// Email address of the [`domain::User`].
    email: String,

    /// Role of the [`domain::User`].
    role: String,

    /// Denormalized current [`Weight`] of the [`domain::User`], in kilograms.
    current_weight: Option<Weight>,

    /// Date and time the [`domain::User`] was registered at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    created_at: user::CreationDateTime,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id,
            name: user.name.to_string(),
            email: user.email.to_string(),
            role: user.role.to_string(),
            current_weight: user.current_weight,
            created_at: user.created_at,
        }
    }
}

/// Response of the [`register()`] and [`login()`] handlers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticated {
    /// Authenticated [`User`].
    pub user: User,

    /// Date and time the issued access token expires at.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: user::session::ExpirationDateTime,
}

/// Request body of the [`register()`] handler.
#[derive(Debug, Deserialize)]
pub struct Register {
    /// Name of the `User` to register.
    pub name: String,

    /// Email address of the `User` to register.
    pub email: String,

    /// Password of the `User` to register.
    pub password: String,
}

define_error! {
    enum ValidationError {
        #[code = "INVALID_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Provided `name` is not a valid `UserName`"]
        Name,

        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "Provided `email` is not a valid `UserEmail`"]
        Email,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Provided `password` is not a valid `UserPassword`"]
        Password,
    }
}

define_error! {
    enum LookupError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the provided ID does not exist"]
        UserNotExists,
    }
}

/// Registers a new `User` and opens a session for them right away, setting
/// both session cookies.
pub async fn register(
    Extension(service): Extension<crate::Service>,
    Extension(cookies): Extension<Cookies>,
    jar: CookieJar,
    Json(body): Json<Register>,
) -> Result<(http::StatusCode, CookieJar, Json<Authenticated>), Error> {
    let name = body
        .name
        .parse::<user::Name>()
        .map_err(|_| Error::from(ValidationError::Name))?;
    let email = body
        .email
        .parse::<user::Email>()
        .map_err(|_| Error::from(ValidationError::Email))?;
    let password = body
        .password
        .parse::<user::Password>()
        .map_err(|_| Error::from(ValidationError::Password))?;

    let user = service
        .execute(CreateUser {
            name,
            email,
            password: SecretBox::new(Box::new(password)),
        })
        .await
        .map_err(AsError::into_error)?;

    let output = service
        .execute(CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)?;

    Ok((
        http::StatusCode::CREATED,
        cookies.apply(jar, output.tokens),
        Json(Authenticated {
            user: output.user.into(),
            expires_at: output.expires_at,
        }),
    ))
}

/// Request body of the [`login()`] handler.
#[derive(Debug, Deserialize)]
pub struct Login {
    /// Email address to authenticate with.
    pub email: String,

    /// Password to authenticate with.
    pub password: String,
}

/// Authenticates a `User` by their credentials, setting both session cookies.
pub async fn login(
    Extension(service): Extension<crate::Service>,
    Extension(cookies): Extension<Cookies>,
    jar: CookieJar,
    Json(body): Json<Login>,
) -> Result<(CookieJar, Json<Authenticated>), Error> {
    define_error! {
        enum Error {
            #[code = "WRONG_CREDENTIALS"]
            #[status = UNAUTHORIZED]
            #[message = "Provided credentials do not match any `User`"]
            WrongCredentials,
        }
    }

    // Malformed credentials cannot match any `User`, so are not
    // distinguished from wrong ones.
    let email = body
        .email
        .parse::<user::Email>()
        .map_err(|_| Error::WrongCredentials)?;
    let password = body
        .password
        .parse::<user::Password>()
        .map_err(|_| Error::WrongCredentials)?;

    let output = service
        .execute(CreateUserSession::ByCredentials {
            email,
            password: SecretBox::new(Box::new(password)),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        cookies.apply(jar, output.tokens),
        Json(Authenticated {
            user: output.user.into(),
            expires_at: output.expires_at,
        }),
    ))
}

/// Lists all the registered `User`s.
pub async fn list(
    Extension(service): Extension<crate::Service>,
) -> Result<Json<Vec<User>>, Error> {
    let users = service
        .execute(query::users::List::by(()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Returns a single `User` by their ID.
pub async fn fetch(
    Extension(service): Extension<crate::Service>,
    Path(id): Path<user::Id>,
) -> Result<Json<User>, Error> {
    service
        .execute(query::user::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .map(|user| Json(user.into()))
        .ok_or_else(|| LookupError::UserNotExists.into())
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserEmail` is occupied by another `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Provided credentials do not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Token(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}
