//! Domain definitions.

pub mod goal;
pub mod progress;
pub mod user;

pub use self::{
    goal::Goal,
    progress::Progress,
    user::{Session, User},
};
