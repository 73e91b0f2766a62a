use std::env;

use crate::services::seat_map::SeatLayout;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Capacity of every generated inventory unit.
    pub seats_per_unit: i32,
    /// Explicit tier sizes, e.g. `[5, 5, 4]`. `None` splits into thirds.
    pub seat_tier_sizes: Option<Vec<i32>>,
    pub inventory_window_days: u32,
    pub inventory_refresh_hours: u64,
    pub seed_reference_data: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("DB_MAX_CONNECTIONS must be a number"),
            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .expect("JWT_EXPIRATION_HOURS must be a number"),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            seats_per_unit: env::var("SEATS_PER_UNIT")
                .unwrap_or_else(|_| "14".to_string())
                .parse()
                .expect("SEATS_PER_UNIT must be a number"),
            seat_tier_sizes: env::var("SEAT_TIER_SIZES").ok().map(|raw| {
                raw.split(',')
                    .map(|part| {
                        part.trim()
                            .parse()
                            .expect("SEAT_TIER_SIZES must be a comma separated list of numbers")
                    })
                    .collect()
            }),
            inventory_window_days: env::var("INVENTORY_WINDOW_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("INVENTORY_WINDOW_DAYS must be a number"),
            inventory_refresh_hours: env::var("INVENTORY_REFRESH_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("INVENTORY_REFRESH_HOURS must be a number"),
            seed_reference_data: env::var("SEED_REFERENCE_DATA")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Seat tier partition for the configured unit capacity.
    pub fn seat_layout(&self) -> SeatLayout {
        let layout = match &self.seat_tier_sizes {
            Some(sizes) => SeatLayout::with_tier_sizes(self.seats_per_unit, sizes),
            None => Ok(SeatLayout::thirds(self.seats_per_unit)),
        };
        layout.expect("SEAT_TIER_SIZES must sum to SEATS_PER_UNIT")
    }
}
