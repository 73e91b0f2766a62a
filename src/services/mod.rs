pub mod audit;
pub mod catalog;
pub mod inventory;
pub mod reservations;
pub mod seat_map;
