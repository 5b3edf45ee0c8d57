//! [`Goal`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Weight};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Fitness goal of a [`User`].
///
/// A [`User`] has at most one [`Goal`] at a time.
#[derive(Clone, Debug)]
pub struct Goal {
    /// ID of the [`User`] this [`Goal`] belongs to.
    pub user_id: user::Id,

    /// [`Kind`] of this [`Goal`].
    pub kind: Kind,

    /// Target [`Weight`] this [`Goal`] aims at, if any.
    pub target_weight: Option<Weight>,

    /// [`DateTime`] this [`Goal`] should be reached by.
    pub target_date: TargetDateTime,

    /// [`DateTime`] when this [`Goal`] was created.
    pub created_at: CreationDateTime,
}

define_kind! {
    #[doc = "Kind of a [`Goal`]."]
    enum Kind {
        #[doc = "Losing weight."]
        LoseWeight = 1,

        #[doc = "Gaining weight."]
        GainWeight = 2,

        #[doc = "Maintaining the current weight."]
        MaintainWeight = 3,
    }
}

/// [`DateTime`] a [`Goal`] should be reached by.
pub type TargetDateTime = DateTimeOf<(Goal, unit::Expiration)>;

/// [`DateTime`] when a [`Goal`] was created.
pub type CreationDateTime = DateTimeOf<(Goal, unit::Creation)>;
