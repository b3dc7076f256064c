//! Configuration management for the loader generator
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (codegen.toml)
//! - Environment variables (CODEGEN__*)
//!
//! ## Example config file (codegen.toml):
//! ```toml
//! [compile]
//! strategy = "two-phase"
//!
//! [render]
//! runtime_crate = "loader_runtime"
//! emit_docs = true
//! derives = ["Debug"]
//!
//! [logging]
//! filter = "familiar_codegen=debug"
//!
//! [output]
//! path = "src/generated/loaders.rs"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codegen::{CompileOptions, RenderProfile};

/// Main configuration for the generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Resolver and emitter settings
    #[serde(default)]
    pub compile: CompileOptions,

    /// Rust rendering settings
    #[serde(default)]
    pub render: RenderProfile,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set
    #[serde(default = "default_filter")]
    pub filter: String,
}

/// Where generated code goes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output file; stdout when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl CodegenConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, with an explicit file taking precedence over
    /// the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["codegen.toml", ".codegen.toml", "config/codegen.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "codegen") {
            let xdg_config = config_dir.config_dir().join("codegen.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // CODEGEN__RENDER__RUNTIME_CRATE=...
        builder = builder.add_source(
            Environment::with_prefix("CODEGEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::ResolutionStrategy;

    #[test]
    fn test_default_config() {
        let config = CodegenConfig::default();
        assert_eq!(config.compile.strategy, ResolutionStrategy::TwoPhase);
        assert_eq!(config.logging.filter, "info");
        assert!(config.output.path.is_none());
    }

    #[test]
    fn test_serialize_config() {
        let config = CodegenConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[compile]"));
        assert!(toml_str.contains("[render]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[compile]\nstrategy = \"single-phase\"\n\n[render]\nruntime_crate = \"salad_rt\"\n",
        )
        .unwrap();

        let config = CodegenConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.compile.strategy, ResolutionStrategy::SinglePhase);
        assert_eq!(config.render.runtime_crate, "salad_rt");
        assert!(config.render.emit_docs);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = CodegenConfig::default();
        config.output.path = Some(PathBuf::from("out/loaders.rs"));
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = CodegenConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.output.path, Some(PathBuf::from("out/loaders.rs")));
    }
}
