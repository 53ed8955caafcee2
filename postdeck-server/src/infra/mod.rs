pub mod config;
pub mod keepalive;

pub use config::Config;
pub use keepalive::KeepaliveState;
