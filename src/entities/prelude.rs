pub use super::gifts::Entity as Gifts;
pub use super::users::Entity as Users;
