//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::User;

use super::DatabaseQuery;

/// Queries a list of all [`User`]s.
pub type List = DatabaseQuery<By<Vec<User>, ()>>;
