mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VAR, Environment};
pub use settings::{
    DatabaseBackendSetting, DatabaseSettings, LoggingSettings, ServerSettings, Settings,
    StorageBackendSetting, StorageSettings,
};
