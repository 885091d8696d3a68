//! Domain service for the gift catalog and reservations.

use thiserror::Error;

use crate::domain::{GiftId, UserId};
use crate::models::Gift;
use crate::services::validation::FieldError;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const LINK_MAX_CHARS: usize = 200;
pub const IMAGE_NAME_MAX_CHARS: usize = 100;
pub const RESERVER_NAME_MAX_CHARS: usize = 100;
pub const COMMENTS_MAX_CHARS: usize = 200;

/// Errors specific to catalog operations.
#[derive(Debug, Error)]
pub enum GiftError {
    #[error("Gift {0} not found")]
    NotFound(GiftId),

    #[error("Gift {0} has already been reserved")]
    AlreadyReserved(GiftId),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Upload error: {0}")]
    Upload(String),
}

impl From<anyhow::Error> for GiftError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// An image part taken from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Raw add-gift form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct GiftSubmission {
    pub title: String,
    pub description: String,
    pub link: String,
    pub price: String,
    pub image: Option<UploadedImage>,
}

/// Raw reservation form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct ReservationSubmission {
    pub name: String,
    pub comments: String,
}

/// Domain service trait for the gift catalog.
#[async_trait::async_trait]
pub trait GiftService: Send + Sync {
    /// All gifts, unfiltered, in storage order.
    async fn list_gifts(&self) -> Result<Vec<Gift>, GiftError>;

    /// Gifts created by one user.
    async fn gifts_for_owner(&self, owner: UserId) -> Result<Vec<Gift>, GiftError>;

    /// Looks up a gift that is still open for reservation.
    ///
    /// # Errors
    ///
    /// [`GiftError::NotFound`] for an unknown id and
    /// [`GiftError::AlreadyReserved`] once someone has claimed it.
    async fn reservable_gift(&self, id: GiftId) -> Result<Gift, GiftError>;

    /// Validates the form, stores the image and creates the gift for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`GiftError::Validation`] with every field problem; nothing is
    /// written in that case.
    async fn add_gift(&self, owner: UserId, submission: GiftSubmission)
    -> Result<Gift, GiftError>;

    /// Puts a name on a gift. One-way: a reserved gift never becomes free again.
    ///
    /// # Errors
    ///
    /// [`GiftError::NotFound`], then [`GiftError::AlreadyReserved`] (no mutation),
    /// then [`GiftError::Validation`] for an empty name.
    async fn reserve_gift(
        &self,
        id: GiftId,
        submission: ReservationSubmission,
    ) -> Result<Gift, GiftError>;
}
