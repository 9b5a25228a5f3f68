//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files (one section per source plus `[global]`)
//! - Validate configuration legality
//! - Generate `AcquisitionConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("grabber.toml")).unwrap();
//! println!("Sources: {}", config.sources.len());
//! ```

mod parser;
mod validator;

pub use contracts::AcquisitionConfig;
pub use parser::ConfigFormat;
pub use validator::{diagnose, SourceDiagnostic};

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<AcquisitionConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AcquisitionConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize AcquisitionConfig to TOML string
    pub fn to_toml(config: &AcquisitionConfig) -> Result<String, ContractError> {
        let sections = parser::to_sections(config)?;
        toml::to_string_pretty(&sections)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize AcquisitionConfig to JSON string
    pub fn to_json(config: &AcquisitionConfig) -> Result<String, ContractError> {
        let sections = parser::to_sections(config)?;
        serde_json::to_string_pretty(&sections)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<AcquisitionConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[global]
rawlog_prefix = "dataset"
max_entries = 50

[front_cam]
driver = "mock"
process_rate = 20.0
payload_bytes = 32

[imu]
driver = "replay"
process_rate = 100.0
path = "imu.jsonl"
loop_playback = true
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].param_bool("loop_playback"), Some(true));
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.global, config2.global);
        assert_eq!(config.sources, config2.sources);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.sources, config2.sources);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[global]
max_entries = 0

[cam]
driver = "mock"
process_rate = 10.0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_entries"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();
        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.sources[0].label, "front_cam");

        let unsupported = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(unsupported.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}
