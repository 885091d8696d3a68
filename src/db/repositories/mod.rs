pub mod gift;
pub mod user;
