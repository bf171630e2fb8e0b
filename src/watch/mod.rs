pub mod discount;
pub mod policy;
pub mod registry;
pub mod subscription;
pub mod watcher;
