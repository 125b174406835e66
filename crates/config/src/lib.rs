// Configuration loading

pub mod settings;

pub use settings::{config_dir, ConfigError, Settings, CONFIG_DIR_ENV};
