//! [`Session`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Claims of a [`User`] session, carried by a signed [`Token`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    #[serde(rename = "id")]
    pub user_id: user::Id,

    /// [`user::Role`] of the [`User`] this [`Session`] belongs to.
    #[serde(rename = "role", with = "role")]
    pub role: user::Role,

    /// [`DateTime`] when this [`Session`] was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssueDateTime,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,

    /// [`DateTime`] when the [`User`] this [`Session`] belongs to has
    /// authenticated with their credentials.
    ///
    /// Preserved across silent renewals, so caps the total lifetime of a
    /// renewal chain.
    #[serde(
        rename = "auth_time",
        with = "common::datetime::serde::unix_timestamp"
    )]
    pub authenticated_at: AuthenticationDateTime,
}

/// Serialization of a [`user::Role`] claim as its [`strum`] string form.
mod role {
    use std::str::FromStr as _;

    use serde::{de::Error as _, Deserialize as _};

    use crate::domain::user;

    pub(super) fn serialize<S: serde::Serializer>(
        role: &user::Role,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&role.to_string())
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<user::Role, D::Error> {
        user::Role::from_str(&String::deserialize(deserializer)?)
            .map_err(D::Error::custom)
    }
}

/// Signed token carrying [`Session`] claims.
#[derive(AsRef, Clone, Debug, Display, FromStr)]
#[as_ref(str, String)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// Pair of [`Token`]s issued for a single [`Session`].
#[derive(Clone, Debug)]
pub struct TokenPair {
    /// Short-lived [`Token`] authorizing requests.
    pub access: Token,

    /// Long-lived [`Token`] allowing a silent renewal of the `access` one.
    pub refresh: Token,
}

/// [`DateTime`] when a [`Session`] was issued.
pub type IssueDateTime = DateTimeOf<(Session, unit::Creation)>;

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

/// [`DateTime`] of the credentials authentication a [`Session`] (or its
/// renewal chain) originates from.
pub type AuthenticationDateTime = DateTimeOf<(Session, unit::Authentication)>;
