//! [`Query`] collection related to [`Progress`]es.

use common::operations::By;

use crate::domain::{user, Progress};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries all [`Progress`]es of a [`User`], most recent first.
///
/// [`User`]: crate::domain::User
pub type ListByUser = DatabaseQuery<By<Vec<Progress>, user::Id>>;
