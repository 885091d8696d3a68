use serde::Serialize;

use crate::domain::{GiftId, Price, UserId};

/// A wishlist item as read from storage, joined with its owner's username.
#[derive(Debug, Clone, Serialize)]
pub struct Gift {
    pub id: GiftId,
    pub title: String,
    pub description: String,
    pub link: String,
    pub price: Price,
    pub image: String,
    pub owner_id: UserId,
    pub owner_username: String,
    pub reserved_by: Option<String>,
    pub comments: Option<String>,
    pub created_at: String,
    pub reserved_at: Option<String>,
}

impl Gift {
    /// A gift can be reserved exactly while nobody has put a name on it.
    #[must_use]
    pub const fn is_reservable(&self) -> bool {
        self.reserved_by.is_none()
    }
}

/// Validated input for creating a gift. The image has already been stored.
#[derive(Debug, Clone)]
pub struct NewGift {
    pub title: String,
    pub description: String,
    pub link: String,
    pub price: Price,
    pub image: String,
}

/// Validated reservation request.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub name: String,
    pub comments: Option<String>,
}
