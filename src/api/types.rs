use serde::Serialize;

use super::flash::Flash;
use crate::db::User;
use crate::models::Gift;
use crate::services::FieldError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: None,
        }
    }

    pub fn field_errors(message: impl Into<String>, fields: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: Some(fields),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct OwnerDto {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct GiftDto {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub link: String,
    pub price: String,
    pub image: String,
    pub image_url: String,
    pub owner: OwnerDto,
    pub reserved_by: Option<String>,
    pub comments: Option<String>,
    pub reservable: bool,
    pub created_at: String,
    pub reserved_at: Option<String>,
}

impl From<Gift> for GiftDto {
    fn from(gift: Gift) -> Self {
        let reservable = gift.is_reservable();
        Self {
            id: gift.id.value(),
            title: gift.title,
            description: gift.description,
            link: gift.link,
            price: gift.price.to_string(),
            image_url: format!("/uploads/{}", gift.image),
            image: gift.image,
            owner: OwnerDto {
                id: gift.owner_id.value(),
                username: gift.owner_username,
            },
            reserved_by: gift.reserved_by,
            comments: gift.comments,
            reservable,
            created_at: gift.created_at,
            reserved_at: gift.reserved_at,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CurrentUserDto {
    pub id: i32,
    pub username: String,
}

impl From<&User> for CurrentUserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username.clone(),
        }
    }
}

/// Everything the catalog page shows.
#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub gifts: Vec<GiftDto>,
    pub flashes: Vec<Flash>,
    pub current_user: Option<CurrentUserDto>,
}

/// An empty form page (login, register, add gift).
#[derive(Debug, Serialize)]
pub struct FormView {
    pub form: &'static str,
    pub fields: &'static [&'static str],
    /// Post-login target carried through the login form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub flashes: Vec<Flash>,
    pub current_user: Option<CurrentUserDto>,
}

/// The caller's own gifts.
#[derive(Debug, Serialize)]
pub struct MyGiftsView {
    pub owner: CurrentUserDto,
    pub gifts: Vec<GiftDto>,
    pub flashes: Vec<Flash>,
}

/// The reservation page for one gift.
#[derive(Debug, Serialize)]
pub struct ReserveView {
    pub gift: GiftDto,
    pub fields: &'static [&'static str],
    pub flashes: Vec<Flash>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub uptime: u64,
    pub database: &'static str,
}
