pub mod attempt_service;
pub mod progress_service;
pub mod statistics_service;
pub mod ticket_service;
pub mod user_service;
