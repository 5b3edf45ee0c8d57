//! [`Command`] definition.

pub mod authorize_user_session;
pub mod check_user_session;
pub mod create_goal;
pub mod create_user;
pub mod create_user_session;
pub mod delete_progress;
pub mod record_daily_progress;
pub mod refresh_user_session;
pub mod update_goal;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    check_user_session::CheckUserSession, create_goal::CreateGoal,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_progress::DeleteProgress,
    record_daily_progress::RecordDailyProgress,
    refresh_user_session::RefreshUserSession, update_goal::UpdateGoal,
};
