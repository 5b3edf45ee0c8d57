//! [`Session`] extraction and silent renewal.

use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    middleware::Next,
    response::{IntoResponse as _, Response},
    Extension,
};
use axum_extra::{
    extract::cookie::{Cookie, CookieJar, SameSite},
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service::{
    command::{self, AuthorizeUserSession, Command as _},
    domain::user::session::{Session, Token, TokenPair},
};

use crate::{define_error, AsError, Error};

/// Parameters of the [`Cookie`]s carrying session [`Token`]s.
#[derive(Clone, Copy, Debug)]
pub struct Cookies {
    /// Lifetime of the [`Cookie`] carrying the access [`Token`].
    pub access_ttl: Duration,

    /// Lifetime of the [`Cookie`] carrying the refresh [`Token`].
    pub refresh_ttl: Duration,
}

impl Cookies {
    /// Name of the [`Cookie`] carrying the access [`Token`].
    pub const ACCESS: &'static str = "jwt";

    /// Name of the [`Cookie`] carrying the refresh [`Token`].
    pub const REFRESH: &'static str = "refreshToken";

    /// Adds both [`Token`]s of the provided [`TokenPair`] to the provided
    /// [`CookieJar`].
    #[must_use]
    pub fn apply(self, jar: CookieJar, tokens: TokenPair) -> CookieJar {
        jar.add(Self::cookie(Self::ACCESS, &tokens.access, self.access_ttl))
            .add(Self::cookie(
                Self::REFRESH,
                &tokens.refresh,
                self.refresh_ttl,
            ))
    }

    /// Builds a session [`Cookie`] carrying the provided [`Token`].
    ///
    /// Session [`Cookie`]s are HTTP-only and cross-site, since the API is
    /// intended to be consumed from a separately hosted frontend.
    fn cookie(
        name: &'static str,
        token: &Token,
        ttl: Duration,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, token.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(true);
        cookie.set_same_site(SameSite::None);
        cookie.set_max_age(time::Duration::try_from(ttl).ok());
        cookie
    }
}

/// [`Session`] of the authenticated `User` performing the request.
///
/// Inserted by the [`authorize`] middleware, so extractable in any handler
/// behind it.
#[derive(Clone, Copy, Debug)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or_else(|| Error::internal(&"missing `CurrentSession`"))
    }
}

/// Extracts session [`Token`]s from the provided [`CookieJar`] and the
/// `Authorization` header.
///
/// The `Authorization: Bearer` header is a fallback source of the access
/// [`Token`] only, the refresh one is carried exclusively by its [`Cookie`].
#[must_use]
pub fn tokens(
    jar: &CookieJar,
    auth: Option<&Authorization<Bearer>>,
) -> (Option<Token>, Option<Token>) {
    let access = jar
        .get(Cookies::ACCESS)
        .map(Cookie::value)
        .or_else(|| auth.map(|a| a.0.token()))
        .and_then(|v| v.parse().ok());
    let refresh = jar
        .get(Cookies::REFRESH)
        .map(Cookie::value)
        .and_then(|v| v.parse().ok());

    (access, refresh)
}

/// Middleware authorizing the request with an [`AuthorizeUserSession`]
/// [`Command`], and performing a silent renewal of the session [`Token`]s
/// whenever the access one cannot be verified anymore.
///
/// Renewed [`Token`]s are re-set as [`Cookie`]s on the response.
///
/// [`Command`]: service::Command
pub async fn authorize(
    Extension(service): Extension<crate::Service>,
    Extension(cookies): Extension<Cookies>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let (access_token, refresh_token) =
        tokens(&jar, auth.as_ref().map(|TypedHeader(a)| a));

    let output = match service
        .execute(AuthorizeUserSession {
            access_token,
            refresh_token,
        })
        .await
    {
        Ok(output) => output,
        Err(e) => return e.into_error().into_response(),
    };

    use command::authorize_user_session::Output;
    let (session, renewed) = match output {
        Output::Authorized(session) => (session, None),
        Output::Renewed { session, tokens } => (session, Some(tokens)),
    };

    _ = req.extensions_mut().insert(CurrentSession(session));
    let response = next.run(req).await;

    if let Some(tokens) = renewed {
        (cookies.apply(jar, tokens), response).into_response()
    } else {
        response
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_TOKEN"]
                #[status = FORBIDDEN]
                #[message = "Provided access token is not authentic"]
                InvalidToken,

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
            Self::InvalidToken => Some(Error::InvalidToken.into()),
            Self::SessionExpired | Self::UserNotExists(_) => {
                Some(Error::SessionExpired.into())
            }
            Self::TokenRequired => Some(Error::TokenRequired.into()),
        }
    }
}
