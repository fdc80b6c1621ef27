pub mod attempt;
pub mod attempt_answer;
pub mod progress;
pub mod question;
pub mod statistics;
pub mod ticket;
pub mod user;
