//! Color themes and their resolution.
//!
//! ## Resolution order
//!
//! ```text
//! resolve(key, theme)
//!   1. "<ns>.<theme>.<key>"          per-theme override
//!   2. "<ns>.default-light.<key>"    universal base
//!   3. key == Custom  -> white
//!   4. key.fallback() -> resolve(fallback, theme)
//!   5. none
//! ```
//!
//! Malformed stored strings count as missing at every step. The loop is
//! bounded by the number of keys, which is enough for any acyclic
//! fallback graph.
//!
//! ## Sharing
//!
//! `ThemeStore` is a cheap handle (`Clone`) over one backing store. Every
//! editor in the process holds a clone, and every read goes to the backing
//! store, so a `set_color` through one handle is visible to all of them on
//! the next read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use syntaxkit_buffer::Color;

use crate::store::{
    ColorStore, DEFAULT_DARK_THEME, DEFAULT_LIGHT_THEME, DefaultsLoader, MemoryColorStore,
    PackagedDefaults, store_key,
};
use crate::{ColorKey, ThemeError};

const BUILTIN_THEMES: [&str; 2] = [DEFAULT_LIGHT_THEME, DEFAULT_DARK_THEME];

struct StoreState {
    backend: Box<dyn ColorStore>,
    defaults_loaded: bool,
}

/// Shared handle to the process-wide theme colors.
#[derive(Clone)]
pub struct ThemeStore {
    state: Arc<RwLock<StoreState>>,
    loader: Arc<dyn DefaultsLoader>,
}

impl ThemeStore {
    /// Creates a store over a backend, with built-in themes from `loader`.
    pub fn new(backend: impl ColorStore + 'static, loader: impl DefaultsLoader + 'static) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState {
                backend: Box::new(backend),
                defaults_loaded: false,
            })),
            loader: Arc::new(loader),
        }
    }

    /// An empty in-memory store with the packaged built-in themes.
    pub fn in_memory() -> Self {
        Self::new(MemoryColorStore::new(), PackagedDefaults)
    }

    /// Writes the built-in themes into the backing store.
    ///
    /// Runs at most once per store. Previously stored built-in colors are
    /// cleared first so a stale value never survives a reload. On failure
    /// the guard stays unset and the next call retries.
    pub fn ensure_defaults_loaded(&self) -> Result<(), ThemeError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.defaults_loaded {
            return Ok(());
        }

        let mut defaults = Vec::with_capacity(BUILTIN_THEMES.len());
        for theme in BUILTIN_THEMES {
            defaults.push((theme, self.loader.load_packaged_theme_defaults(theme)?));
        }

        for theme in BUILTIN_THEMES {
            for key in ColorKey::ALL {
                state.backend.remove(&store_key(theme, key.as_str()));
            }
        }

        for (theme, values) in defaults {
            let mut written = 0;
            for key in ColorKey::ALL {
                if let Some(value) = values.get(key.as_str()) {
                    state.backend.set(&store_key(theme, key.as_str()), value.clone());
                    written += 1;
                }
            }
            tracing::debug!("Loaded {} default colors for theme {}", written, theme);
        }

        state.defaults_loaded = true;
        Ok(())
    }

    /// Returns true once the built-in themes have been written.
    pub fn defaults_loaded(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .defaults_loaded
    }

    /// Resolves the color of `key` in `theme_name`.
    ///
    /// Returns `None` when no step of the resolution order yields a color;
    /// callers leave the text unpainted in that case.
    pub fn resolve(&self, key: ColorKey, theme_name: &str) -> Option<Color> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        resolve_in(state.backend.as_ref(), key, theme_name)
    }

    /// Stores an override for `key` in `theme_name`. Theme colors are
    /// opaque; alpha is not stored.
    pub fn set_color(&self, color: Color, key: ColorKey, theme_name: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state
            .backend
            .set(&store_key(theme_name, key.as_str()), color.to_hex());
    }

    /// Builds a resolved snapshot of a theme, loading the built-in themes
    /// first if this is the first theme built from this store.
    pub fn theme(&self, name: &str) -> Result<Theme, ThemeError> {
        self.ensure_defaults_loaded()?;

        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut colors = [None; ColorKey::COUNT];
        for key in ColorKey::ALL {
            colors[key.index()] = resolve_in(state.backend.as_ref(), *key, name);
        }

        Ok(Theme {
            name: name.to_string(),
            font: FontSpec::default(),
            colors,
        })
    }
}

impl std::fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeStore")
            .field("defaults_loaded", &self.defaults_loaded())
            .finish_non_exhaustive()
    }
}

fn stored_color(store: &dyn ColorStore, theme_name: &str, key: ColorKey) -> Option<Color> {
    store
        .get(&store_key(theme_name, key.as_str()))
        .and_then(|value| Color::from_hex(&value))
}

fn resolve_in(store: &dyn ColorStore, key: ColorKey, theme_name: &str) -> Option<Color> {
    let mut current = key;

    for _ in 0..=ColorKey::COUNT {
        if let Some(color) = stored_color(store, theme_name, current) {
            return Some(color);
        }
        if let Some(color) = stored_color(store, DEFAULT_LIGHT_THEME, current) {
            return Some(color);
        }
        if current == ColorKey::Custom {
            return Some(Color::WHITE);
        }
        match current.fallback() {
            Some(next) => current = next,
            None => return None,
        }
    }

    tracing::error!("Fallback chain for {} does not terminate", key);
    None
}

/// Font used to render a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Menlo".to_string(),
            size: 14.0,
        }
    }
}

/// A resolved theme: a name, a font, and one color slot per `ColorKey`.
///
/// Built by `ThemeStore::theme`. The table is a snapshot; `set_color`
/// updates both the store and the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    name: String,
    font: FontSpec,
    colors: [Option<Color>; ColorKey::COUNT],
}

impl Theme {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    pub fn with_font(mut self, font: FontSpec) -> Self {
        self.font = font;
        self
    }

    /// The resolved color for a key.
    #[inline]
    pub fn color(&self, key: ColorKey) -> Option<Color> {
        self.colors[key.index()]
    }

    /// Iterates over every key with its resolved color.
    pub fn colors(&self) -> impl Iterator<Item = (ColorKey, Option<Color>)> + '_ {
        ColorKey::ALL.iter().map(|key| (*key, self.color(*key)))
    }

    /// Overrides a color, writing through to the store. Alpha is dropped
    /// so the snapshot matches what the store resolves.
    pub fn set_color(&mut self, store: &ThemeStore, color: Color, key: ColorKey) {
        let color = Color::rgb(color.r, color.g, color.b);
        store.set_color(color, key, &self.name);
        self.colors[key.index()] = Some(color);
    }

    /// Applies overrides from a JSON object of `{"<key>": "#RRGGBB"}`.
    ///
    /// Unknown keys and malformed colors are skipped. Returns the number of
    /// overrides applied.
    pub fn load_overrides(
        &mut self,
        store: &ThemeStore,
        path: impl AsRef<Path>,
    ) -> Result<usize, ThemeError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let values: BTreeMap<String, String> = serde_json::from_str(&content)?;

        let mut applied = 0;
        for (raw_key, raw_color) in &values {
            let (Ok(key), Some(color)) = (raw_key.parse::<ColorKey>(), Color::from_hex(raw_color))
            else {
                tracing::debug!("Skipping theme override {} = {}", raw_key, raw_color);
                continue;
            };
            self.set_color(store, color, key);
            applied += 1;
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct CountingLoader {
        calls: Arc<AtomicUsize>,
    }

    impl DefaultsLoader for CountingLoader {
        fn load_packaged_theme_defaults(
            &self,
            theme_name: &str,
        ) -> Result<BTreeMap<String, String>, ThemeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PackagedDefaults.load_packaged_theme_defaults(theme_name)
        }
    }

    struct EmptyLoader;

    impl DefaultsLoader for EmptyLoader {
        fn load_packaged_theme_defaults(
            &self,
            _theme_name: &str,
        ) -> Result<BTreeMap<String, String>, ThemeError> {
            Ok(BTreeMap::new())
        }
    }

    fn bare_store() -> ThemeStore {
        ThemeStore::new(MemoryColorStore::new(), EmptyLoader)
    }

    #[test]
    fn test_defaults_loaded_once() {
        let loader = CountingLoader::default();
        let calls = loader.calls.clone();
        let store = ThemeStore::new(MemoryColorStore::new(), loader);

        store.theme(DEFAULT_DARK_THEME).unwrap();
        store.theme("custom-theme").unwrap();
        store.clone().theme(DEFAULT_LIGHT_THEME).unwrap();

        assert!(store.defaults_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stale_builtin_colors_are_replaced() {
        let mut backend = MemoryColorStore::new();
        backend.set(
            &store_key(DEFAULT_LIGHT_THEME, ColorKey::Keyword.as_str()),
            "#123456".to_string(),
        );
        let store = ThemeStore::new(backend, PackagedDefaults);

        let theme = store.theme(DEFAULT_LIGHT_THEME).unwrap();
        assert_eq!(theme.color(ColorKey::Keyword), Color::from_hex("#AA0D91"));
    }

    #[test]
    fn test_override_beats_base() {
        let store = ThemeStore::in_memory();
        store.ensure_defaults_loaded().unwrap();
        let pink = Color::rgb(255, 0, 128);

        store.set_color(pink, ColorKey::Keyword, "mine");
        assert_eq!(store.resolve(ColorKey::Keyword, "mine"), Some(pink));
        assert_eq!(
            store.resolve(ColorKey::Keyword, "other"),
            Color::from_hex("#AA0D91")
        );
    }

    #[test]
    fn test_dark_theme_uses_own_colors() {
        let store = ThemeStore::in_memory();
        let dark = store.theme(DEFAULT_DARK_THEME).unwrap();
        assert_eq!(dark.color(ColorKey::PlainText), Some(Color::WHITE));
        assert_eq!(dark.color(ColorKey::Keyword), Color::from_hex("#FC5FA3"));
    }

    #[test]
    fn test_fallback_chain_is_followed() {
        let store = bare_store();
        let green = Color::rgb(0, 200, 0);
        store.set_color(green, ColorKey::Comment, "t");

        assert_eq!(store.resolve(ColorKey::MultilineComment, "t"), Some(green));
        assert_eq!(store.resolve(ColorKey::CommentTag, "t"), Some(green));
    }

    #[test]
    fn test_custom_defaults_to_white() {
        let store = bare_store();
        assert_eq!(store.resolve(ColorKey::Custom, "t"), Some(Color::WHITE));
        // keyword -> plain text -> custom
        assert_eq!(store.resolve(ColorKey::Keyword, "t"), Some(Color::WHITE));
    }

    #[test]
    fn test_malformed_color_falls_through() {
        let mut backend = MemoryColorStore::new();
        backend.set(&store_key("t", "string"), "#12345".to_string());
        backend.set(&store_key(DEFAULT_LIGHT_THEME, "string"), "#00FF00".to_string());
        let store = ThemeStore::new(backend, EmptyLoader);

        assert_eq!(
            store.resolve(ColorKey::String, "t"),
            Some(Color::rgb(0, 255, 0))
        );
    }

    #[test]
    fn test_resolution_terminates_for_every_key() {
        let store = bare_store();
        for key in ColorKey::ALL {
            // Every chain in an empty store ends at custom's hard default.
            assert_eq!(store.resolve(*key, "t"), Some(Color::WHITE), "{key}");
        }
    }

    #[test]
    fn test_set_color_updates_snapshot_and_store() {
        let store = ThemeStore::in_memory();
        let mut theme = store.theme("editor").unwrap();
        let other_handle = store.clone();
        let orange = Color::rgb(255, 165, 0);

        theme.set_color(&store, orange, ColorKey::Number);

        assert_eq!(theme.color(ColorKey::Number), Some(orange));
        assert_eq!(other_handle.resolve(ColorKey::Number, "editor"), Some(orange));
        assert_eq!(
            other_handle.theme("editor").unwrap().color(ColorKey::Number),
            Some(orange)
        );
    }

    #[test]
    fn test_translucent_override_is_stored_opaque() {
        let store = ThemeStore::in_memory();
        let mut theme = store.theme("editor").unwrap();

        theme.set_color(&store, Color::rgba(10, 20, 30, 128), ColorKey::Comment);

        assert_eq!(theme.color(ColorKey::Comment), Some(Color::rgb(10, 20, 30)));
        assert_eq!(
            theme.color(ColorKey::Comment),
            store.resolve(ColorKey::Comment, "editor")
        );
    }

    #[test]
    fn test_load_overrides_from_file() {
        let store = ThemeStore::in_memory();
        let mut theme = store.theme("file-theme").unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br##"{"keyword": "#010203", "no_such_key": "#FFFFFF", "string": "red"}"##,
        )
        .unwrap();

        let applied = theme.load_overrides(&store, file.path()).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(theme.color(ColorKey::Keyword), Some(Color::rgb(1, 2, 3)));
        assert_eq!(
            store.resolve(ColorKey::Keyword, "file-theme"),
            Some(Color::rgb(1, 2, 3))
        );
    }

    #[test]
    fn test_load_overrides_missing_file() {
        let store = ThemeStore::in_memory();
        let mut theme = store.theme("x").unwrap();
        assert!(matches!(
            theme.load_overrides(&store, "/nonexistent/overrides.json"),
            Err(ThemeError::Io(_))
        ));
    }

    proptest! {
        #[test]
        fn test_set_then_resolve_round_trips(
            key_idx in 0..ColorKey::COUNT,
            r in any::<u8>(),
            g in any::<u8>(),
            b in any::<u8>(),
        ) {
            let store = ThemeStore::in_memory();
            store.ensure_defaults_loaded().unwrap();
            let key = ColorKey::ALL[key_idx];
            let color = Color::rgb(r, g, b);

            store.set_color(color, key, "prop");
            prop_assert_eq!(store.resolve(key, "prop"), Some(color));
        }
    }
}
