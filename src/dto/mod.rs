pub mod attempt_dto;
pub mod ticket_dto;
pub mod user_dto;
