pub mod auth;
pub mod rate_limit;
pub mod user_rate_limit;
