pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind};
use services::seat_map::SeatLayout;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub seat_layout: SeatLayout,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let seat_layout = config.seat_layout();
        Self {
            db,
            config,
            seat_layout,
        }
    }
}
