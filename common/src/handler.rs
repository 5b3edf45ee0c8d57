//! [`Handler`] abstractions.

use std::future::Future;

/// Abstract executable operation.
///
/// Commands, queries and database operations are all expressed as
/// [`Handler`]s over different `Args`.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
