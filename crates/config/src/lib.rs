// Configuration loading

pub mod settings;

pub use settings::{
    ConfigError, DatabaseSettings, PolicySettings, RegistrySettings, Settings,
    DEFAULT_API_BASE, TOKEN_ENV,
};
