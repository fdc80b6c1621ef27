pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    attempt_service::AttemptService, statistics_service::StatisticsService,
    ticket_service::TicketService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ticket_service: TicketService,
    pub attempt_service: AttemptService,
    pub statistics_service: StatisticsService,
    pub user_service: UserService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let ticket_service = TicketService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let statistics_service = StatisticsService::new(pool.clone());
        let user_service = UserService::new(pool.clone());

        Self {
            pool,
            ticket_service,
            attempt_service,
            statistics_service,
            user_service,
        }
    }
}
