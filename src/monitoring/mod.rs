pub mod health;
pub mod logger;
