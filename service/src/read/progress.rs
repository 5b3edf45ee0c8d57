//! [`Progress`] read model definition.

use common::DateTime;

#[cfg(doc)]
use crate::domain::Progress;
use crate::domain::{progress, user};

/// Wrapper around [`Progress`] indicating that it's the most recently
/// recorded one of a [`User`].
///
/// [`User`]: crate::domain::User
#[derive(Clone, Debug)]
pub struct Latest<T>(pub T);

/// Inclusive range covering a single UTC calendar day.
#[derive(Clone, Copy, Debug)]
pub struct DayRange {
    /// [`DateTime`] of the day start (midnight).
    pub start: progress::RecordingDateTime,

    /// [`DateTime`] of the very last moment of the day.
    pub end: progress::RecordingDateTime,
}

impl DayRange {
    /// Returns the [`DayRange`] containing the given [`DateTime`].
    #[must_use]
    pub fn containing(at: DateTime) -> Self {
        Self {
            start: at.start_of_day().coerce(),
            end: at.end_of_day().coerce(),
        }
    }
}

/// Selector of a [`User`]'s [`Progress`] recorded within a single day.
///
/// [`User`]: crate::domain::User
#[derive(Clone, Copy, Debug)]
pub struct ForDay {
    /// ID of the [`User`] the [`Progress`] belongs to.
    ///
    /// [`User`]: crate::domain::User
    pub user_id: user::Id,

    /// [`DayRange`] to look within.
    pub range: DayRange,
}
