pub mod config;
pub mod error;
pub mod notifier;
pub mod platform;
pub mod poller;
pub mod shutdown;
pub mod status;
