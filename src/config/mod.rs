// Configuration management module
// TOML settings live under the platform config directory

pub mod settings;

pub use settings::{
    Config, ConfigError, DatabaseConfig, EmbeddingsConfig, SearchConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("kb-mcp"))
        .ok_or(ConfigError::DirectoryError)
}
