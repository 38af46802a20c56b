//! Infrastructure layer: stores, mail transport, configuration.
//!
//! Adapters here implement the `pharmacie-reorder` ports. Each one is chosen
//! once at startup from [`config::AppConfig`].

pub mod config;
pub mod notifier;
pub mod seed;
pub mod store;

pub use config::{AppConfig, ConfigError, NotifierConfig};
