use axum::{
    Extension, Form, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{CurrentUser, current_user, form_view};
use super::flash::{self, FlashLevel};
use super::{
    ApiError, ApiResponse, AppState, CatalogView, CurrentUserDto, FormView, GiftDto, MyGiftsView,
    ReserveView,
};
use crate::constants::routes::CATALOG;
use crate::domain::GiftId;
use crate::services::{GiftError, GiftSubmission, ReservationSubmission, UploadedImage};

const GIFT_FORM_FIELDS: &[&str] = &["title", "description", "link", "price", "image"];
const RESERVE_FORM_FIELDS: &[&str] = &["name", "comments"];

const ALREADY_RESERVED: &str = "This gift has already been reserved.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReserveForm {
    pub name: String,
    pub comments: String,
}

/// GET /
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<CatalogView>>, ApiError> {
    let gifts = state.gifts().list_gifts().await?;
    let current_user = current_user(&state, &session).await?;
    let flashes = flash::take(&session).await?;

    Ok(Json(ApiResponse::success(CatalogView {
        gifts: gifts.into_iter().map(GiftDto::from).collect(),
        flashes,
        current_user: current_user.as_ref().map(CurrentUserDto::from),
    })))
}

/// GET /add_gift
pub async fn add_gift_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<FormView>>, ApiError> {
    form_view(&state, &session, "add_gift", GIFT_FORM_FIELDS, None).await
}

/// POST /add_gift
pub async fn add_gift(
    State(state): State<Arc<AppState>>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let submission = read_gift_form(multipart).await?;
    let gift = state.gifts().add_gift(user.id, submission).await?;

    tracing::info!(
        gift_id = %gift.id,
        owner = %user.username,
        image = %gift.image,
        "Gift added"
    );

    flash::push(&session, FlashLevel::Success, "Gift added successfully!").await?;
    Ok(Redirect::to(CATALOG))
}

/// GET /gift/{id}
pub async fn reserve_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let gift = match state.gifts().reservable_gift(parse_gift_id(&raw_id)?).await {
        Ok(gift) => gift,
        Err(GiftError::AlreadyReserved(_)) => return already_reserved(&session).await,
        Err(e) => return Err(e.into()),
    };

    let flashes = flash::take(&session).await?;

    Ok(Json(ApiResponse::success(ReserveView {
        gift: GiftDto::from(gift),
        fields: RESERVE_FORM_FIELDS,
        flashes,
    }))
    .into_response())
}

/// POST /gift/{id}
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(raw_id): Path<String>,
    Form(form): Form<ReserveForm>,
) -> Result<Response, ApiError> {
    let id = parse_gift_id(&raw_id)?;
    let submission = ReservationSubmission {
        name: form.name,
        comments: form.comments,
    };

    match state.gifts().reserve_gift(id, submission).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Gift reserved successfully!").await?;
            Ok(Redirect::to(CATALOG).into_response())
        }
        Err(GiftError::AlreadyReserved(_)) => already_reserved(&session).await,
        Err(e) => Err(e.into()),
    }
}

/// GET /my_gifts
pub async fn my_gifts(
    State(state): State<Arc<AppState>>,
    session: Session,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<MyGiftsView>>, ApiError> {
    let gifts = state.gifts().gifts_for_owner(user.id).await?;
    let flashes = flash::take(&session).await?;

    Ok(Json(ApiResponse::success(MyGiftsView {
        owner: CurrentUserDto::from(&user),
        gifts: gifts.into_iter().map(GiftDto::from).collect(),
        flashes,
    })))
}

/// Anything that cannot name a stored gift is simply not found.
fn parse_gift_id(raw: &str) -> Result<GiftId, ApiError> {
    raw.parse::<i32>()
        .map(GiftId::from)
        .map_err(|_| ApiError::not_found("Gift", raw))
}

async fn already_reserved(session: &Session) -> Result<Response, ApiError> {
    flash::push(session, FlashLevel::Warning, ALREADY_RESERVED).await?;
    Ok(Redirect::to(CATALOG).into_response())
}

/// Collects the add-gift parts. Unknown parts are ignored; a file input left
/// empty by the browser counts as no image.
async fn read_gift_form(mut multipart: Multipart) -> Result<GiftSubmission, ApiError> {
    let mut submission = GiftSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "title" => submission.title = field.text().await.map_err(multipart_error)?,
            "description" => {
                submission.description = field.text().await.map_err(multipart_error)?;
            }
            "link" => submission.link = field.text().await.map_err(multipart_error)?,
            "price" => submission.price = field.text().await.map_err(multipart_error)?,
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if filename.is_empty() && bytes.is_empty() {
                    continue;
                }
                submission.image = Some(UploadedImage {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(submission)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::validation(err.body_text())
    }
}
