pub mod uploads;
pub mod validation;

pub use uploads::UploadStore;
pub use validation::{FieldError, FieldErrors};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, Registration};
pub use auth_service_impl::SeaOrmAuthService;

pub mod gift_service;
pub mod gift_service_impl;
pub use gift_service::{
    GiftError, GiftService, GiftSubmission, ReservationSubmission, UploadedImage,
};
pub use gift_service_impl::SeaOrmGiftService;
