//! Read entities definitions.

pub mod progress;
