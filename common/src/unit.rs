//! Marker types.

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Marker type describing an authentication moment.
#[derive(Clone, Copy, Debug)]
pub struct Authentication;

/// Marker type describing an entity being recorded.
#[derive(Clone, Copy, Debug)]
pub struct Recording;
