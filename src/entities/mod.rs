pub mod booking_modification;
pub mod inventory;
pub mod reservation;
pub mod route;
pub mod schedule;
pub mod user;
