//! Design tokens handed to themed style definitions.
//!
//! A [`Theme`] is a flat-or-nested map of JSON values. Themed definitions read
//! it when their rules are evaluated, and injected instances compare it by
//! value to decide whether their dynamic rules need recomputing.
//!
//! ```rust
//! use stylebind::Theme;
//!
//! let theme = Theme::from_yaml(r#"
//! primary: steelblue
//! spacing: 4
//! "#).unwrap();
//!
//! assert_eq!(theme.get_str("primary"), Some("steelblue"));
//! ```

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::StyleError;

/// A named collection of design tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Theme {
    name: Option<String>,
    tokens: Map<String, Value>,
}

impl Theme {
    /// Creates an empty, unnamed theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty theme with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            tokens: Map::new(),
        }
    }

    /// Sets a token, returning `self` for chaining.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tokens.insert(key.into(), value.into());
        self
    }

    /// Parses a theme from a YAML mapping.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::Parse`] if the content is not a YAML mapping.
    pub fn from_yaml(yaml: &str) -> Result<Self, StyleError> {
        let tokens: Map<String, Value> = serde_yaml::from_str(yaml)?;
        Ok(Self { name: None, tokens })
    }

    /// Loads a theme from a YAML file, naming it after the file stem.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StyleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StyleError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let theme = Self::from_yaml(&content)?;
        Ok(match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => theme.with_name(stem),
            None => theme,
        })
    }

    /// Sets the name on this theme.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the theme name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Looks up a token.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tokens.get(key)
    }

    /// Looks up a token that holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the names of all tokens.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(|k| k.as_str())
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the theme has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
