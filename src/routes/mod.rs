pub mod attempts;
pub mod health;
pub mod telegram;
pub mod tickets;
pub mod users;
