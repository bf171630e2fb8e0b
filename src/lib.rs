pub mod bot;
pub mod config;
pub mod monitoring;
pub mod notify;
pub mod store;
pub mod watch;
