use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    LogFormat, LoggingSettings, MetricsSettings, ProviderSettings, ServerSettings, Settings,
};

/// Prefix of the environment variables that override file settings,
/// e.g. `VALUELAB__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "VALUELAB";

/// Loads the application configuration from the `config.toml` file.
///
/// This function is the primary entry point for this crate. It layers the
/// built-in defaults, an optional `config.toml` and `VALUELAB__*` environment
/// variables, deserializes the result into our strongly-typed `Settings`
/// struct and validates it.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Same as [`load_config`] with an explicit file path. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.build()?.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
