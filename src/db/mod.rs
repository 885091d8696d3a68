use crate::config::SecurityConfig;
use crate::domain::{GiftId, UserId};
use crate::models::{Gift, NewGift, Reservation};
use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tokio::task;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn gift_repo(&self) -> repositories::gift::GiftRepository {
        repositories::gift::GiftRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Hashes the password off the async runtime and inserts the user.
    /// Returns `None` when the username is already taken.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || {
            repositories::user::hash_password(&password, &security)
        })
        .await
        .context("Password hashing task panicked")??;

        self.user_repo().create(username, &password_hash).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    // ========================================================================
    // Gifts
    // ========================================================================

    pub async fn add_gift(&self, owner: UserId, gift: &NewGift) -> Result<GiftId> {
        self.gift_repo().add(owner, gift).await
    }

    pub async fn get_gift(&self, id: GiftId) -> Result<Option<Gift>> {
        self.gift_repo().get(id).await
    }

    pub async fn list_gifts(&self) -> Result<Vec<Gift>> {
        self.gift_repo().list_all().await
    }

    pub async fn list_gifts_for_owner(&self, owner: UserId) -> Result<Vec<Gift>> {
        self.gift_repo().list_for_owner(owner).await
    }

    pub async fn reserve_gift(&self, id: GiftId, reservation: &Reservation) -> Result<bool> {
        self.gift_repo().reserve(id, reservation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Price;
    use crate::entities::users;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    async fn stored_hash(store: &Store, username: &str) -> Option<String> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&store.conn)
            .await
            .unwrap()
            .map(|u| u.password_hash)
    }

    async fn test_store() -> Store {
        let db_path = std::env::temp_dir().join(format!(
            "wishlist-store-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        Store::new(&format!("sqlite:{}", db_path.display()))
            .await
            .expect("failed to open store")
    }

    fn cheap_security() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    fn new_gift(title: &str) -> NewGift {
        NewGift {
            title: title.to_string(),
            description: "Something nice".to_string(),
            link: "https://example.com/item".to_string(),
            price: Price::from_cents(1999).unwrap(),
            image: "item.png".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_leaves_first_user_untouched() {
        let store = test_store().await;
        let security = cheap_security();

        let first = store
            .create_user("alice", "first-password", &security)
            .await
            .unwrap()
            .expect("first registration should succeed");
        let hash_before = stored_hash(&store, "alice").await;

        let second = store
            .create_user("alice", "second-password", &security)
            .await
            .unwrap();
        assert!(second.is_none());

        let hash_after = stored_hash(&store, "alice").await;
        assert_eq!(hash_before, hash_after);
        assert_eq!(store.get_user_by_username("alice").await.unwrap(), Some(first));
        assert!(store.verify_user_password("alice", "first-password").await.unwrap().is_some());
        assert!(store.verify_user_password("alice", "second-password").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_user_fails_verification() {
        let store = test_store().await;
        assert!(store.verify_user_password("ghost", "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reservation_is_compare_and_set() {
        let store = test_store().await;
        let owner = store
            .create_user("owner", "pw", &cheap_security())
            .await
            .unwrap()
            .unwrap();
        let id = store.add_gift(owner.id, &new_gift("Kettle")).await.unwrap();

        let alice = Reservation {
            name: "Alice".to_string(),
            comments: Some("for the new flat".to_string()),
        };
        let bob = Reservation {
            name: "Bob".to_string(),
            comments: None,
        };

        assert!(store.reserve_gift(id, &alice).await.unwrap());
        assert!(!store.reserve_gift(id, &bob).await.unwrap());

        let gift = store.get_gift(id).await.unwrap().unwrap();
        assert_eq!(gift.reserved_by.as_deref(), Some("Alice"));
        assert_eq!(gift.comments.as_deref(), Some("for the new flat"));
        assert!(gift.reserved_at.is_some());
        assert!(!gift.is_reservable());
    }

    #[tokio::test]
    async fn reserving_missing_gift_changes_nothing() {
        let store = test_store().await;
        let reservation = Reservation {
            name: "Anonymous".to_string(),
            comments: None,
        };
        assert!(!store.reserve_gift(GiftId::new(404), &reservation).await.unwrap());
    }

    #[tokio::test]
    async fn gifts_are_listed_in_storage_order_with_owners() {
        let store = test_store().await;
        let security = cheap_security();
        let ann = store.create_user("ann", "pw", &security).await.unwrap().unwrap();
        let ben = store.create_user("ben", "pw", &security).await.unwrap().unwrap();

        store.add_gift(ann.id, &new_gift("Book")).await.unwrap();
        store.add_gift(ben.id, &new_gift("Lamp")).await.unwrap();
        store.add_gift(ann.id, &new_gift("Scarf")).await.unwrap();

        let all = store.list_gifts().await.unwrap();
        let titles: Vec<&str> = all.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, ["Book", "Lamp", "Scarf"]);
        assert_eq!(all[1].owner_username, "ben");
        assert_eq!(all[1].owner_id, ben.id);

        let anns = store.list_gifts_for_owner(ann.id).await.unwrap();
        assert_eq!(anns.len(), 2);
        assert!(anns.iter().all(|g| g.owner_username == "ann"));
    }
}
