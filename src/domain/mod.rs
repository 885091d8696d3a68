//! Domain types for the wishlist with strong typing.
//!
//! Newtype wrappers keep user and gift identifiers from being mixed up, and
//! [`Price`] keeps money exact by storing minor units instead of floats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a registered user.
///
/// # Examples
///
/// ```rust
/// use wishlist::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<UserId> for i32 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Unique identifier for a gift on the wishlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftId(i32);

impl GiftId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for GiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for GiftId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl From<GiftId> for i32 {
    fn from(id: GiftId) -> Self {
        id.0
    }
}

/// A strictly positive amount with two fractional digits, held in minor units.
///
/// Parsing accepts `12`, `12.5`, `12.50` and the comma form `12,50`.
/// Serializes as a decimal string so clients never see float rounding.
///
/// ```rust
/// use wishlist::domain::Price;
///
/// let price: Price = "19,9".parse().unwrap();
/// assert_eq!(price.cents(), 1990);
/// assert_eq!(price.to_string(), "19.90");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("Price is required")]
    Empty,

    #[error("Price must be a number such as 12.50")]
    Malformed,

    #[error("Price may have at most two decimal places")]
    TooPrecise,

    #[error("Price must be greater than zero")]
    NotPositive,

    #[error("Price is too large")]
    Overflow,
}

impl Price {
    /// Builds a price from minor units. Returns `None` unless `cents > 0`.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Option<Self> {
        if cents > 0 { Some(Self(cents)) } else { None }
    }

    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let normalized = trimmed.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (normalized.as_str(), ""),
        };

        if whole.starts_with('-') {
            return Err(PriceError::NotPositive);
        }

        let whole = whole.strip_prefix('+').unwrap_or(whole);
        if whole.is_empty() && fraction.is_empty() {
            return Err(PriceError::Malformed);
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(PriceError::Malformed);
        }
        if fraction.len() > 2 {
            return Err(PriceError::TooPrecise);
        }

        let units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| PriceError::Overflow)?
        };
        let minor: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| PriceError::Malformed)? * 10,
            _ => fraction.parse().map_err(|_| PriceError::Malformed)?,
        };

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or(PriceError::Overflow)?;

        Self::from_cents(cents).ok_or(PriceError::NotPositive)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
