//! Backing storage for theme colors.
//!
//! Colors live in a flat string key/value store under keys of the form
//! `"<namespace>.<theme>.<key>"` with `#RRGGBB` values. The store itself is
//! a host service (a preferences database, a settings file); the engine
//! only needs `get`, `set` and `remove`. `MemoryColorStore` is the
//! in-process implementation.
//!
//! Built-in theme colors come from a `DefaultsLoader`. The packaged loader
//! serves JSON documents embedded at compile time.

use std::collections::{BTreeMap, HashMap};

use crate::ThemeError;

/// Namespace prefix for every key this crate writes.
pub const STORE_NAMESPACE: &str = "syntaxkit";

/// Name of the built-in light theme. Its stored colors are the base every
/// other theme falls back to.
pub const DEFAULT_LIGHT_THEME: &str = "default-light";

/// Name of the built-in dark theme. Grammars without an explicit
/// appearance use it.
pub const DEFAULT_DARK_THEME: &str = "default-dark";

const DEFAULT_LIGHT_JSON: &str = include_str!("../themes/default-light.json");
const DEFAULT_DARK_JSON: &str = include_str!("../themes/default-dark.json");

/// Builds the store key for one theme color.
pub fn store_key(theme_name: &str, key_raw: &str) -> String {
    format!("{STORE_NAMESPACE}.{theme_name}.{key_raw}")
}

/// A string key/value service holding theme colors.
pub trait ColorStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);

    fn remove(&mut self, key: &str);
}

/// In-memory `ColorStore`.
#[derive(Debug, Clone, Default)]
pub struct MemoryColorStore {
    values: HashMap<String, String>,
}

impl MemoryColorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ColorStore for MemoryColorStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Source of the built-in theme definitions.
///
/// Returns a map from color key raw value to `#RRGGBB` string.
pub trait DefaultsLoader: Send + Sync {
    fn load_packaged_theme_defaults(
        &self,
        theme_name: &str,
    ) -> Result<BTreeMap<String, String>, ThemeError>;
}

/// Serves the light and dark themes compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackagedDefaults;

impl DefaultsLoader for PackagedDefaults {
    fn load_packaged_theme_defaults(
        &self,
        theme_name: &str,
    ) -> Result<BTreeMap<String, String>, ThemeError> {
        let source = match theme_name {
            DEFAULT_LIGHT_THEME => DEFAULT_LIGHT_JSON,
            DEFAULT_DARK_THEME => DEFAULT_DARK_JSON,
            _ => return Err(ThemeError::UnknownBuiltin(theme_name.to_string())),
        };

        serde_json::from_str(source).map_err(|e| ThemeError::Defaults {
            theme: theme_name.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColorKey;
    use syntaxkit_buffer::Color;

    #[test]
    fn test_store_key_shape() {
        assert_eq!(
            store_key("midnight", ColorKey::Keyword.as_str()),
            "syntaxkit.midnight.keyword"
        );
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryColorStore::new();
        store.set("a", "#000000".to_string());
        assert_eq!(store.get("a").as_deref(), Some("#000000"));
        store.remove("a");
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_packaged_themes_are_well_formed() {
        for theme in [DEFAULT_LIGHT_THEME, DEFAULT_DARK_THEME] {
            let values = PackagedDefaults.load_packaged_theme_defaults(theme).unwrap();
            assert!(values.contains_key(ColorKey::PlainText.as_str()));
            for (key, value) in &values {
                assert!(key.parse::<ColorKey>().is_ok(), "{theme}: unknown key {key}");
                assert!(Color::from_hex(value).is_some(), "{theme}: bad color {value}");
            }
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(matches!(
            PackagedDefaults.load_packaged_theme_defaults("solarized"),
            Err(ThemeError::UnknownBuiltin(_))
        ));
    }
}
