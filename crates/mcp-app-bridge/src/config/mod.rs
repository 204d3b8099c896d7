//! Configuration loading and resolution.

pub mod loader;

pub use loader::{load_config, BridgeConfig, CONFIG_ENV_VAR};
