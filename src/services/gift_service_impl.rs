//! `SeaORM` implementation of the `GiftService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::Store;
use crate::domain::{GiftId, Price, PriceError, UserId};
use crate::models::{Gift, NewGift, Reservation};
use crate::services::gift_service::{
    COMMENTS_MAX_CHARS, DESCRIPTION_MAX_CHARS, GiftError, GiftService, GiftSubmission,
    IMAGE_NAME_MAX_CHARS, LINK_MAX_CHARS, RESERVER_NAME_MAX_CHARS, ReservationSubmission,
    TITLE_MAX_CHARS,
};
use crate::services::uploads::{
    ALLOWED_IMAGE_EXTENSIONS, UploadStore, has_image_extension, sanitize_filename,
};
use crate::services::validation::{FieldError, FieldErrors};

pub struct SeaOrmGiftService {
    store: Store,
    uploads: UploadStore,
}

impl SeaOrmGiftService {
    #[must_use]
    pub const fn new(store: Store, uploads: UploadStore) -> Self {
        Self { store, uploads }
    }
}

#[cfg_attr(test, derive(Debug))]
struct ValidGift {
    title: String,
    description: String,
    link: String,
    price: Price,
    image_name: String,
    image_bytes: Vec<u8>,
}

fn validate_gift(submission: GiftSubmission) -> Result<ValidGift, Vec<FieldError>> {
    let mut errors = FieldErrors::new();

    let title = errors.required("title", "Title", &submission.title);
    if let Some(title) = &title {
        errors.max_chars("title", "Title", title, TITLE_MAX_CHARS);
    }

    let description = errors.required("description", "Description", &submission.description);
    if let Some(description) = &description {
        errors.max_chars("description", "Description", description, DESCRIPTION_MAX_CHARS);
    }

    let link = errors.required("link", "Link", &submission.link);
    if let Some(link) = &link {
        errors.max_chars("link", "Link", link, LINK_MAX_CHARS);
    }

    let price = match submission.price.parse::<Price>() {
        Ok(price) => Some(price),
        Err(PriceError::Empty) => {
            errors.add("price", "Price is required");
            None
        }
        Err(e) => {
            errors.add("price", e.to_string());
            None
        }
    };

    let mut image = None;
    match submission.image {
        None => errors.add("image", "Image is required"),
        Some(upload) if upload.bytes.is_empty() => errors.add("image", "Image file is empty"),
        Some(upload) => match sanitize_filename(&upload.filename) {
            None => errors.add("image", "Image filename is not usable"),
            Some(name) if name.chars().count() > IMAGE_NAME_MAX_CHARS => errors.add(
                "image",
                format!("Image filename must be at most {IMAGE_NAME_MAX_CHARS} characters"),
            ),
            Some(name) if !has_image_extension(&name) => errors.add(
                "image",
                format!(
                    "Image must be one of: {}",
                    ALLOWED_IMAGE_EXTENSIONS.join(", ")
                ),
            ),
            Some(name) => image = Some((name, upload.bytes)),
        },
    }

    // Each missing value above recorded an error, so `errors` is non-empty here.
    let (Some(title), Some(description), Some(link), Some(price), Some((image_name, image_bytes))) =
        (title, description, link, price, image)
    else {
        return Err(errors.into());
    };

    errors.finish(|| ValidGift {
        title,
        description,
        link,
        price,
        image_name,
        image_bytes,
    })
}

fn validate_reservation(submission: &ReservationSubmission) -> Result<Reservation, Vec<FieldError>> {
    let mut errors = FieldErrors::new();

    let name = errors.required("name", "Your name", &submission.name);
    if let Some(name) = &name {
        errors.max_chars("name", "Your name", name, RESERVER_NAME_MAX_CHARS);
    }

    let comments = submission.comments.trim();
    errors.max_chars("comments", "Comment", comments, COMMENTS_MAX_CHARS);

    errors.finish(|| Reservation {
        name: name.unwrap_or_default(),
        comments: (!comments.is_empty()).then(|| comments.to_string()),
    })
}

impl SeaOrmGiftService {
    async fn existing_gift(&self, id: GiftId) -> Result<Gift, GiftError> {
        self.store
            .get_gift(id)
            .await?
            .ok_or(GiftError::NotFound(id))
    }
}

#[async_trait]
impl GiftService for SeaOrmGiftService {
    async fn list_gifts(&self) -> Result<Vec<Gift>, GiftError> {
        Ok(self.store.list_gifts().await?)
    }

    async fn gifts_for_owner(&self, owner: UserId) -> Result<Vec<Gift>, GiftError> {
        Ok(self.store.list_gifts_for_owner(owner).await?)
    }

    async fn reservable_gift(&self, id: GiftId) -> Result<Gift, GiftError> {
        let gift = self.existing_gift(id).await?;
        if gift.is_reservable() {
            Ok(gift)
        } else {
            Err(GiftError::AlreadyReserved(id))
        }
    }

    async fn add_gift(
        &self,
        owner: UserId,
        submission: GiftSubmission,
    ) -> Result<Gift, GiftError> {
        let valid = validate_gift(submission).map_err(GiftError::Validation)?;

        let staged = self
            .uploads
            .stage(&valid.image_name, &valid.image_bytes)
            .await
            .map_err(|e| GiftError::Upload(format!("{e:#}")))?;

        let new_gift = NewGift {
            title: valid.title,
            description: valid.description,
            link: valid.link,
            price: valid.price,
            image: valid.image_name,
        };

        // The image only replaces a file of the same name once the row exists.
        let id = match self.store.add_gift(owner, &new_gift).await {
            Ok(id) => id,
            Err(e) => {
                staged.discard().await;
                return Err(e.into());
            }
        };

        staged
            .commit()
            .await
            .map_err(|e| GiftError::Upload(format!("{e:#}")))?;

        metrics::counter!("wishlist_gifts_created_total").increment(1);

        self.existing_gift(id).await
    }

    async fn reserve_gift(
        &self,
        id: GiftId,
        submission: ReservationSubmission,
    ) -> Result<Gift, GiftError> {
        self.reservable_gift(id).await?;

        let reservation = validate_reservation(&submission).map_err(GiftError::Validation)?;

        if !self.store.reserve_gift(id, &reservation).await? {
            warn!(gift_id = %id, "Lost reservation race, gift already taken");
            return Err(GiftError::AlreadyReserved(id));
        }

        metrics::counter!("wishlist_gifts_reserved_total").increment(1);
        info!(gift_id = %id, reserved_by = %reservation.name, "Gift reserved");

        self.existing_gift(id).await
    }
}
