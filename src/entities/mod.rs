pub mod prelude;

pub mod gifts;
pub mod users;
