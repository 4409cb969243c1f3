pub mod connection;
pub mod error;
pub mod mongo_config;
pub mod setup_target;
pub mod store;
