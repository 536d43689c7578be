//! Disk texture storage configuration
//!
//! Handed over by the owner at start-up. Nothing here reads the environment
//! or the file system on its own.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::reload;
use crate::error::DiskTextureResult;

/// Container used for dumped textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One file per texture, native payload where possible
    #[default]
    Dds,
    /// One RGBA8 file per (level, slice)
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Dds => crate::constants::files::DDS_EXTENSION,
            OutputFormat::Png => crate::constants::files::PNG_EXTENSION,
        }
    }
}

/// Disk texture storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskTextureConfig {
    /// Where dumps are written, also searched on import and watched for edits
    pub output_directory: Option<PathBuf>,

    /// Extra directories searched on import, in order
    pub input_directories: Vec<PathBuf>,

    /// Dump textures as the GPU decodes them
    pub enable_dump: bool,

    pub output_format: OutputFormat,

    /// Watch the output directory and reload edited files
    pub enable_real_time_edit: bool,

    /// Changes within this many seconds of our own write are ignored
    pub reload_guard_window_secs: i64,

    /// Attempts to read a changed file before dropping the event
    pub reload_read_attempts: u32,

    /// Pause between read attempts
    pub reload_retry_delay_ms: u64,
}

impl Default for DiskTextureConfig {
    fn default() -> Self {
        Self {
            output_directory: None,
            input_directories: Vec::new(),
            enable_dump: false,
            output_format: OutputFormat::default(),
            enable_real_time_edit: false,
            reload_guard_window_secs: reload::GUARD_WINDOW_SECS,
            reload_read_attempts: reload::READ_ATTEMPTS,
            reload_retry_delay_ms: reload::RETRY_DELAY_MS,
        }
    }
}

impl DiskTextureConfig {
    /// Parse a configuration kept by the owner as TOML
    pub fn from_toml_str(source: &str) -> DiskTextureResult<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn reload_retry_delay(&self) -> Duration {
        Duration::from_millis(self.reload_retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiskTextureConfig::default();
        assert!(!config.enable_dump);
        assert_eq!(config.output_format, OutputFormat::Dds);
        assert_eq!(config.reload_guard_window_secs, 5);
        assert_eq!(config.reload_read_attempts, 100);
        assert_eq!(config.reload_retry_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_from_toml() {
        let config = DiskTextureConfig::from_toml_str(
            r#"
            output_directory = "/tmp/dump"
            input_directories = ["/mods/a", "/mods/b"]
            enable_dump = true
            output_format = "png"
            enable_real_time_edit = true
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.output_directory, Some(PathBuf::from("/tmp/dump")));
        assert_eq!(config.input_directories.len(), 2);
        assert_eq!(config.output_format, OutputFormat::Png);
        assert!(config.enable_real_time_edit);
        assert_eq!(config.reload_read_attempts, 100);
    }

    #[test]
    fn test_bad_toml_is_a_config_error() {
        let error = DiskTextureConfig::from_toml_str("output_format = 3").unwrap_err();
        assert!(matches!(error, crate::error::DiskTextureError::Config(_)));
    }
}
