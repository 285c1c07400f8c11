// Configuration management module
// TOML settings plus the interactive editor

pub mod interactive;
pub mod settings;

#[cfg(test)]
mod tests;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    AnswerConfig, Config, ConfigError, DocumentConfig, OllamaConfig, RetrievalConfig,
};

/// Resolve the configuration directory, preferring an explicit override
#[inline]
pub fn get_config_dir(override_dir: Option<&std::path::Path>) -> Result<std::path::PathBuf, ConfigError> {
    match override_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Config::default_dir(),
    }
}
