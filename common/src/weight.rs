//! [`Weight`]-related definitions.

use std::str::FromStr;

use derive_more::{Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

/// Body weight, in kilograms.
#[derive(Clone, Copy, Debug, Display, Into, PartialEq, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Weight(f64);

impl Weight {
    /// Maximum representable [`Weight`], in kilograms.
    pub const MAX_KG: f64 = 1000.0;

    /// Creates a new [`Weight`] without checking the value.
    ///
    /// # Safety
    ///
    /// The provided `kg` must be a valid [`Weight`] value.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(kg: f64) -> Self {
        Self(kg)
    }

    /// Creates a new [`Weight`] if the given `kg` value is valid.
    #[must_use]
    pub fn new(kg: f64) -> Option<Self> {
        Self::check(kg).then_some(Self(kg))
    }

    /// Returns this [`Weight`] in kilograms.
    #[must_use]
    pub const fn kg(self) -> f64 {
        self.0
    }

    /// Checks whether the given `kg` value is a valid [`Weight`].
    fn check(kg: f64) -> bool {
        kg.is_finite() && kg > 0.0 && kg <= Self::MAX_KG
    }
}

impl FromStr for Weight {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kg = f64::from_str(s).map_err(|_| "invalid `Weight`")?;
        Self::new(kg).ok_or("`Weight` out of range")
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Weight;

    #[test]
    fn from_str() {
        assert_eq!(Weight::from_str("72.5").unwrap(), Weight::new(72.5).unwrap());
        assert_eq!(Weight::from_str("1000").unwrap().kg(), 1000.0);

        assert!(Weight::from_str("0").is_err());
        assert!(Weight::from_str("-1").is_err());
        assert!(Weight::from_str("1000.1").is_err());
        assert!(Weight::from_str("NaN").is_err());
        assert!(Weight::from_str("72,5").is_err());
    }
}
