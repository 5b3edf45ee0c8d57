//! Session token [`Codec`] definitions.

use std::time::Duration;

use common::DateTime;
use derive_more::{Debug, Display, Error, From};
use jsonwebtoken::{
    errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};

use crate::domain::user::{
    self,
    session::{self, Session, Token, TokenPair},
};

/// Configuration of a session token [`Codec`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Secret the session [`Token`]s are signed with.
    #[debug(skip)]
    pub secret: String,

    /// Expiration [`Duration`] of issued access [`Token`]s.
    pub access_ttl: Duration,

    /// Expiration [`Duration`] of issued refresh [`Token`]s.
    pub refresh_ttl: Duration,

    /// Maximum [`Session`] age, counted from its first authentication.
    ///
    /// Renewal re-issues both [`Token`]s and so slides their expiration
    /// windows forward. Without this cap a continuously active session would
    /// never expire.
    pub max_session_age: Duration,
}

impl Config {
    /// Default [`Config::access_ttl`].
    pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(60 * 60);

    /// Default [`Config::refresh_ttl`].
    pub const DEFAULT_REFRESH_TTL: Duration =
        Duration::from_secs(7 * 24 * 60 * 60);

    /// Default [`Config::max_session_age`].
    pub const DEFAULT_MAX_SESSION_AGE: Duration =
        Duration::from_secs(30 * 24 * 60 * 60);

    /// Creates a new [`Config`] with the provided `secret` and the default
    /// expiration durations.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Self::DEFAULT_ACCESS_TTL,
            refresh_ttl: Self::DEFAULT_REFRESH_TTL,
            max_session_age: Self::DEFAULT_MAX_SESSION_AGE,
        }
    }
}

/// Codec issuing and verifying signed session [`Token`]s.
#[derive(Clone, Debug)]
pub struct Codec {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// Expiration [`Duration`] of issued access [`Token`]s.
    access_ttl: Duration,

    /// Expiration [`Duration`] of issued refresh [`Token`]s.
    refresh_ttl: Duration,

    /// Maximum [`Session`] age, counted from its first authentication.
    max_session_age: Duration,
}

impl Codec {
    /// Creates a new [`Codec`] from the provided [`Config`].
    ///
    /// # Errors
    ///
    /// With a [`MissingSecretError`] if the signing secret is absent.
    pub fn new(conf: &Config) -> Result<Self, MissingSecretError> {
        if conf.secret.is_empty() {
            return Err(MissingSecretError);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(conf.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(conf.secret.as_bytes()),
            access_ttl: conf.access_ttl,
            refresh_ttl: conf.refresh_ttl,
            max_session_age: conf.max_session_age,
        })
    }

    /// Returns the maximum [`Session`] age this [`Codec`] permits.
    #[must_use]
    pub fn max_session_age(&self) -> Duration {
        self.max_session_age
    }

    /// Issues a new signed [`Token`] carrying the provided identity, expiring
    /// after the provided `ttl`.
    ///
    /// # Errors
    ///
    /// With an [`IssueError`] if signing fails.
    pub fn issue(
        &self,
        user_id: user::Id,
        role: user::Role,
        authenticated_at: session::AuthenticationDateTime,
        ttl: Duration,
    ) -> Result<(Token, Session), IssueError> {
        let issued_at = DateTime::now();
        let session = Session {
            user_id,
            role,
            issued_at: issued_at.coerce(),
            expires_at: (issued_at + ttl).coerce(),
            authenticated_at,
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &session,
            &self.encoding_key,
        )
        .map_err(IssueError)?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid `Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { Token::new_unchecked(token) };

        Ok((token, session))
    }

    /// Issues a new access/refresh [`TokenPair`] carrying the provided
    /// identity, along with the access [`Session`] claims.
    ///
    /// # Errors
    ///
    /// With an [`IssueError`] if signing fails.
    pub fn issue_pair(
        &self,
        user_id: user::Id,
        role: user::Role,
        authenticated_at: session::AuthenticationDateTime,
    ) -> Result<(TokenPair, Session), IssueError> {
        let (access, session) =
            self.issue(user_id, role, authenticated_at, self.access_ttl)?;
        let (refresh, _) =
            self.issue(user_id, role, authenticated_at, self.refresh_ttl)?;

        Ok((TokenPair { access, refresh }, session))
    }

    /// Verifies the provided [`Token`]'s signature and expiration, returning
    /// its [`Session`] claims.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Expired`] if the [`Token`] is past its expiration;
    /// - [`VerifyError::Malformed`] if its signature or structure is invalid.
    pub fn verify(&self, token: &Token) -> Result<Session, VerifyError> {
        let mut validation = Validation::default();
        // No clock tolerance: a `Token` past its `exp` is expired right away.
        validation.leeway = 0;

        jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.decoding_key,
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                VerifyError::Expired
            } else {
                VerifyError::Malformed(e)
            }
        })
    }

    /// Parses the provided [`Token`]'s [`Session`] claims without verifying
    /// its signature or expiration.
    ///
    /// Intended for best-effort identity extraction (diagnostics) only, and
    /// must never gate an authorization decision by itself.
    #[must_use]
    pub fn decode(&self, token: &Token) -> Option<Session> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.decoding_key,
            &validation,
        )
        .ok()
        .map(|data| data.claims)
    }
}

/// Error of creating a [`Codec`] without a signing secret.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("Session token signing secret is absent or empty")]
pub struct MissingSecretError;

/// Error of issuing a new [`Token`].
#[derive(Debug, Display, Error, From)]
#[display("Failed to encode a JSON Web Token: {_0}")]
pub struct IssueError(jsonwebtoken::errors::Error);

/// Error of verifying a [`Token`].
#[derive(Debug, Display, Error)]
pub enum VerifyError {
    /// [`Token`] is past its expiration.
    #[display("Session token is expired")]
    Expired,

    /// [`Token`]'s signature or structure is invalid.
    #[display("Malformed session token: {_0}")]
    Malformed(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;

    use crate::{domain::user, testing};

    use super::{Codec, Config, VerifyError};

    fn codec() -> Codec {
        Codec::new(&Config::new(testing::SECRET)).unwrap()
    }

    #[test]
    fn refuses_empty_secret() {
        assert!(Codec::new(&Config::new("")).is_err());
    }

    #[test]
    fn verify_roundtrips_identity() {
        let codec = codec();
        let user_id = user::Id::new();

        let (token, _) = codec
            .issue(
                user_id,
                user::Role::Admin,
                DateTime::now().coerce(),
                Duration::from_secs(60),
            )
            .unwrap();
        let session = codec.verify(&token).unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.role, user::Role::Admin);
    }

    #[test]
    fn verify_rejects_expired() {
        let codec = codec();
        let token = testing::expired_token(testing::SECRET, user::Id::new());

        assert!(matches!(
            codec.verify(&token).unwrap_err(),
            VerifyError::Expired,
        ));
    }

    #[test]
    fn verify_rejects_just_expired() {
        let codec = codec();
        let token = testing::token_expired_for(
            testing::SECRET,
            user::Id::new(),
            Duration::from_secs(30),
        );

        assert!(matches!(
            codec.verify(&token).unwrap_err(),
            VerifyError::Expired,
        ));
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let codec = codec();
        let foreign = Codec::new(&Config::new("other-secret")).unwrap();

        let (token, _) = foreign
            .issue(
                user::Id::new(),
                user::Role::User,
                DateTime::now().coerce(),
                Duration::from_secs(60),
            )
            .unwrap();

        assert!(matches!(
            codec.verify(&token).unwrap_err(),
            VerifyError::Malformed(_),
        ));
    }

    #[test]
    fn decode_ignores_signature_and_expiry() {
        let codec = codec();
        let user_id = user::Id::new();
        let token = testing::expired_token("other-secret", user_id);

        let session = codec.decode(&token).unwrap();

        assert_eq!(session.user_id, user_id);
        assert!(codec.verify(&token).is_err());
    }
}
