//! Model configuration file loading
//!
//! The model file is optional. Anything that keeps it from being read
//! (missing, unreadable, empty, malformed) falls back to the built-in
//! defaults with a log entry instead of stopping the bot.

use crate::config::GptConfig;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────────────
// Load Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Load the model configuration from `path`, falling back to defaults.
///
/// ```ignore
/// let config = load_gpt_config(Path::new("./conf/gpt.yaml"));
/// println!("Model: {}", config.model.name);
/// ```
pub fn load_gpt_config(path: &Path) -> GptConfig {
    try_load_gpt_config(path)
        .unwrap_or_warn_default(GptConfig::default(), "Failed to load model configuration")
}

/// Load the model configuration from `path`.
///
/// A missing or empty file yields the defaults with a warning. Unreadable
/// or malformed files are errors.
pub fn try_load_gpt_config(path: &Path) -> Result<GptConfig> {
    if !path.exists() {
        warn!(
            "Model config not found at {}, using defaults",
            path.display()
        );
        return Ok(GptConfig::default());
    }

    debug!("Loading model config from: {}", path.display());

    let contents = fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    if contents.trim().is_empty() {
        warn!("Model config at {} is empty, using defaults", path.display());
        return Ok(GptConfig::default());
    }

    let config = GptConfig::from_yaml_sanitized(&contents).map_err(|e| {
        warn!(
            "Model config at {} contains invalid YAML: {}",
            path.display(),
            e
        );
        Error::ConfigParse {
            message: format!("Failed to parse model config: {}", e),
            source: Some(Box::new(e)),
        }
    })?;

    info!(
        "Model configuration loaded from {} (model {})",
        path.display(),
        config.model.name
    );
    Ok(config)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MODEL;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Temporary directory holding a single model config file.
    struct TestEnv {
        _temp_dir: TempDir,
        config_file: PathBuf,
    }

    impl TestEnv {
        fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let config_file = temp_dir.path().join("gpt.yaml");
            Self {
                _temp_dir: temp_dir,
                config_file,
            }
        }

        fn write_config(&self, content: &str) {
            fs::write(&self.config_file, content).expect("Failed to write config");
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let env = TestEnv::new();
        let config = try_load_gpt_config(&env.config_file).unwrap();
        assert_eq!(config, GptConfig::default());
    }

    #[test]
    fn test_missing_config_loads_defaults() {
        let env = TestEnv::new();
        assert!(!env.config_file.exists());
        assert_eq!(load_gpt_config(&env.config_file), GptConfig::default());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let env = TestEnv::new();
        env.write_config("  \n");
        let config = try_load_gpt_config(&env.config_file).unwrap();
        assert_eq!(config, GptConfig::default());
    }

    #[test]
    fn test_load_valid_config() {
        let env = TestEnv::new();
        env.write_config("model:\n  name: gpt-4o\n  temperature: 0.3\nprompt: Answer in haiku.\n");

        let config = try_load_gpt_config(&env.config_file).unwrap();
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.model.temperature, Some(0.3));
        assert_eq!(config.prompt, "Answer in haiku.");
    }

    #[test]
    fn test_load_config_sanitizes_values() {
        let env = TestEnv::new();
        env.write_config("model:\n  name: ''\n  top_p: 3.0\n");

        let config = try_load_gpt_config(&env.config_file).unwrap();
        assert_eq!(config.model.name, DEFAULT_MODEL);
        assert_eq!(config.model.top_p, Some(1.0));
    }

    #[test]
    fn test_corrupted_config_is_error() {
        let env = TestEnv::new();
        env.write_config("model: [unterminated");

        let result = try_load_gpt_config(&env.config_file);
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_corrupted_config_falls_back_to_defaults() {
        let env = TestEnv::new();
        env.write_config("model:\n  temperature: warm\n");

        assert_eq!(load_gpt_config(&env.config_file), GptConfig::default());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let env = TestEnv::new();
        env.write_config("prompt: Hi.\nlegacy_option: true\n");

        let config = try_load_gpt_config(&env.config_file).unwrap();
        assert_eq!(config.prompt, "Hi.");
    }
}
