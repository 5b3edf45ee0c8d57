//! [`Progress`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Weight};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Daily progress record of a [`User`].
///
/// At most one [`Progress`] exists per [`User`] per calendar day.
#[derive(Clone, Debug)]
pub struct Progress {
    /// ID of this [`Progress`].
    pub id: Id,

    /// ID of the [`User`] this [`Progress`] belongs to.
    pub user_id: user::Id,

    /// [`Weight`] measured by this [`Progress`].
    pub weight: Weight,

    /// [`Calories`] consumed, if reported.
    pub calories: Option<Calories>,

    /// [`DateTime`] when this [`Progress`] was recorded.
    pub recorded_at: RecordingDateTime,
}

/// ID of a [`Progress`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Calories consumption reported by a [`Progress`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Calories(i32);

impl Calories {
    /// Creates new [`Calories`] without checking the value.
    ///
    /// # Safety
    ///
    /// The provided `value` must be a valid [`Calories`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(value: i32) -> Self {
        Self(value)
    }

    /// Creates new [`Calories`] if the given `value` is valid.
    #[must_use]
    pub const fn new(value: i32) -> Option<Self> {
        if value >= 0 {
            Some(Self(value))
        } else {
            None
        }
    }
}

/// [`DateTime`] when a [`Progress`] was recorded.
pub type RecordingDateTime = DateTimeOf<(Progress, unit::Recording)>;
