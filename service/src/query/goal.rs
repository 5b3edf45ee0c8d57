//! [`Query`] collection related to a [`Goal`].

use common::operations::By;

use crate::domain::{user, Goal};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Goal`] by the [`user::Id`] it belongs to.
pub type ByUserId = DatabaseQuery<By<Option<Goal>, user::Id>>;
