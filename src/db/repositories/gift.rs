use crate::domain::{GiftId, Price, UserId};
use crate::entities::{gifts, prelude::*, users};
use crate::models::{Gift, NewGift, Reservation};
use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::info;

/// Repository for gift operations
pub struct GiftRepository {
    conn: DatabaseConnection,
}

impl GiftRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_gift_model(gift: gifts::Model, owner: Option<users::Model>) -> Result<Gift> {
        let price = Price::from_cents(gift.price_cents)
            .with_context(|| format!("Gift {} has a non-positive price", gift.id))?;

        Ok(Gift {
            id: GiftId::new(gift.id),
            title: gift.title,
            description: gift.description,
            link: gift.link,
            price,
            image: gift.image,
            owner_id: UserId::new(gift.created_by),
            owner_username: owner.map(|u| u.username).unwrap_or_default(),
            reserved_by: gift.reserved_by,
            comments: gift.comments,
            created_at: gift.created_at,
            reserved_at: gift.reserved_at,
        })
    }

    fn map_rows(rows: Vec<(gifts::Model, Option<users::Model>)>) -> Result<Vec<Gift>> {
        rows.into_iter()
            .map(|(gift, owner)| Self::map_gift_model(gift, owner))
            .collect()
    }

    // ========================================================================
    // Gift Operations
    // ========================================================================

    pub async fn add(&self, owner: UserId, gift: &NewGift) -> Result<GiftId> {
        let active_model = gifts::ActiveModel {
            title: Set(gift.title.clone()),
            description: Set(gift.description.clone()),
            link: Set(gift.link.clone()),
            price_cents: Set(gift.price.cents()),
            image: Set(gift.image.clone()),
            created_by: Set(owner.value()),
            reserved_by: Set(None),
            comments: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            reserved_at: Set(None),
            ..Default::default()
        };

        let res = Gifts::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert gift")?;
        info!("Added gift {} for user {}", res.last_insert_id, owner);
        Ok(GiftId::new(res.last_insert_id))
    }

    pub async fn get(&self, id: GiftId) -> Result<Option<Gift>> {
        let row = Gifts::find_by_id(id.value())
            .find_also_related(Users)
            .one(&self.conn)
            .await
            .context("Failed to query gift")?;

        row.map(|(gift, owner)| Self::map_gift_model(gift, owner))
            .transpose()
    }

    /// Every gift in storage order.
    pub async fn list_all(&self) -> Result<Vec<Gift>> {
        let rows = Gifts::find()
            .find_also_related(Users)
            .order_by_asc(gifts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list gifts")?;

        Self::map_rows(rows)
    }

    pub async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Gift>> {
        let rows = Gifts::find()
            .find_also_related(Users)
            .filter(gifts::Column::CreatedBy.eq(owner.value()))
            .order_by_asc(gifts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list gifts for owner")?;

        Self::map_rows(rows)
    }

    /// Compare-and-set reservation: writes only while `reserved_by` is still NULL.
    /// Returns `false` when the gift is missing or someone else got there first.
    pub async fn reserve(&self, id: GiftId, reservation: &Reservation) -> Result<bool> {
        let result = Gifts::update_many()
            .col_expr(
                gifts::Column::ReservedBy,
                Expr::value(reservation.name.clone()),
            )
            .col_expr(
                gifts::Column::Comments,
                Expr::value(reservation.comments.clone()),
            )
            .col_expr(
                gifts::Column::ReservedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(gifts::Column::Id.eq(id.value()))
            .filter(gifts::Column::ReservedBy.is_null())
            .exec(&self.conn)
            .await
            .context("Failed to reserve gift")?;

        Ok(result.rows_affected == 1)
    }
}
