//! Editor configuration.
//!
//! Loaded from `<config dir>/syntaxkit/config.toml`. Every section and
//! field is `#[serde(default)]`, so a partial file only overrides what it
//! names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Smart-edit behavior
    pub editor: EditorConfig,

    /// Theme and font
    pub appearance: AppearanceConfig,

    /// Extra grammar files, keyed by file suffix
    pub grammars: BTreeMap<String, PathBuf>,
}

impl Config {
    /// Loads config from the default location, falling back to defaults.
    pub fn load() -> Self {
        match Self::load_from_default_path() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("syntaxkit").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Grammar file registered for `suffix`, compared case-insensitively.
    pub fn grammar_path(&self, suffix: &str) -> Option<&Path> {
        self.grammars
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(suffix))
            .map(|(_, path)| path.as_path())
    }
}

/// Smart-edit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of one indent level when indenting with spaces
    pub tab_size: usize,

    /// Indent with `tab_size` spaces instead of a tab
    pub use_spaces: bool,

    /// Indent new lines to the bracket depth
    pub auto_indent: bool,

    /// Close brackets, quotes and block comments
    pub auto_close: bool,

    /// Tab jumps to placeholders and selections snap to them
    pub placeholder_navigation: bool,
}

impl EditorConfig {
    /// Text of one indent level.
    pub fn indent_unit(&self) -> String {
        if self.use_spaces {
            " ".repeat(self.tab_size)
        } else {
            "\t".to_string()
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_size: 4,
            use_spaces: false,
            auto_indent: true,
            auto_close: true,
            placeholder_navigation: true,
        }
    }
}

/// Appearance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Theme name; the grammar's own appearance when unset
    pub theme: Option<String>,

    /// Font family
    pub font_family: String,

    /// Font size in points
    pub font_size: f32,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            theme: None,
            font_family: "Menlo".to_string(),
            font_size: 14.0,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor.tab_size, 4);
        assert!(!config.editor.use_spaces);
        assert!(config.editor.auto_close);
        assert_eq!(config.appearance.font_size, 14.0);
        assert_eq!(config.appearance.theme, None);
    }

    #[test]
    fn test_indent_unit() {
        let mut editor = EditorConfig::default();
        assert_eq!(editor.indent_unit(), "\t");
        editor.use_spaces = true;
        editor.tab_size = 2;
        assert_eq!(editor.indent_unit(), "  ");
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.editor.use_spaces = true;
        config.appearance.theme = Some("midnight".to_string());
        config
            .grammars
            .insert("kt".to_string(), PathBuf::from("/grammars/kotlin.json"));

        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[editor]\nauto_close = false\n").unwrap();
        assert!(!config.editor.auto_close);
        assert!(config.editor.auto_indent);
        assert_eq!(config.appearance.font_family, "Menlo");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.editor.tab_size = 8;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_grammar_path_ignores_case() {
        let mut config = Config::default();
        config
            .grammars
            .insert("Kt".to_string(), PathBuf::from("kotlin.json"));
        assert_eq!(config.grammar_path("kt"), Some(Path::new("kotlin.json")));
        assert_eq!(config.grammar_path("rs"), None);
    }
}
