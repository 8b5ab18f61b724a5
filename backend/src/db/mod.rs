pub mod connection;
pub mod matches;
pub mod migrations;
pub mod preferences;

pub use connection::{DatabaseConfig, get_db_pool};
