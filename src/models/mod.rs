pub mod gift;

pub use gift::{Gift, NewGift, Reservation};
