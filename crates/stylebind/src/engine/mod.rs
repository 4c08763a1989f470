//! The styling engine: compiles definitions into sheets.
//!
//! A [`StyleEngine`] owns everything whose scope is "one engine":
//!
//! - the class-name counter, so generated names never collide
//! - the rendering [`Surface`] its sheets attach to
//! - the [`SheetCache`], which guarantees one sheet per definition
//!
//! A process-wide default engine is built lazily on first use and can be
//! replaced with [`set_default_engine`], the same way the rest of the crate's
//! global defaults work.
//!
//! ```rust
//! use stylebind::{RuleSet, SheetOptions, StyleEngine};
//!
//! let engine = StyleEngine::new();
//! let sheet = engine
//!     .create_style_sheet(RuleSet::new().rule("button", [("color", "red")]), SheetOptions::new())
//!     .unwrap();
//!
//! sheet.attach();
//! assert_eq!(engine.surface().len(), 1);
//! assert!(engine.surface().to_css().contains("color: red"));
//! ```

mod naming;
mod sheet;
mod surface;

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::cache::{Released, SheetCache};
use crate::error::{Result, StyleError};
use crate::index::next_index;
use crate::registry::SheetsRegistry;
use crate::style::{StyleDefinition, StyleInput};
use crate::util::lock;

use naming::ClassNameGenerator;

pub use sheet::{Classes, SheetId, SheetOptions, StyleSheet};
pub use surface::Surface;

static NEXT_ENGINE_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique identity of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(u32);

impl EngineId {
    #[cfg(test)]
    pub(crate) fn new(id: u32) -> Self {
        EngineId(id)
    }

    /// The raw number, as used in generated class names.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// Engine configuration.
///
/// ```rust
/// use stylebind::EngineConfig;
///
/// let config = EngineConfig::from_yaml("class_prefix: app-").unwrap();
/// assert_eq!(config.class_prefix, "app-");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Prepended to every generated class name.
    pub class_prefix: String,
}

impl EngineConfig {
    /// Parses a configuration from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, StyleError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, StyleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StyleError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }
}

/// Compiles style definitions and manages the sheets it compiled.
pub struct StyleEngine {
    id: EngineId,
    config: EngineConfig,
    naming: Arc<ClassNameGenerator>,
    surface: Arc<Surface>,
    cache: Mutex<SheetCache>,
}

impl Default for StyleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let id = EngineId(NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            naming: Arc::new(ClassNameGenerator::new(config.class_prefix.clone(), id)),
            config,
            surface: Arc::new(Surface::new()),
            cache: Mutex::new(SheetCache::new()),
        }
    }

    /// This engine's identity.
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// This engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The surface this engine's sheets attach to.
    pub fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    /// Compiles a definition against empty dynamic input.
    ///
    /// The sheet is returned detached and is not tracked by the cache.
    pub fn create_style_sheet(
        &self,
        definition: impl Into<StyleDefinition>,
        options: SheetOptions,
    ) -> std::result::Result<Arc<StyleSheet>, StyleError> {
        self.compile(&definition.into(), &StyleInput::default(), options)
    }

    /// Compiles a definition against the given dynamic input.
    ///
    /// A definition that wraps a pre-built sheet yields that sheet. Without
    /// an explicit `index`, one is drawn from the global index allocator.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError`] if the rules cannot be evaluated or are invalid.
    pub fn compile(
        &self,
        definition: &StyleDefinition,
        input: &StyleInput,
        options: SheetOptions,
    ) -> std::result::Result<Arc<StyleSheet>, StyleError> {
        if let Some(sheet) = definition.as_sheet() {
            return Ok(Arc::clone(sheet));
        }
        let rules = definition.rules(input)?;
        rules.validate()?;
        let index = options.index.unwrap_or_else(next_index);
        let source = definition.is_dynamic().then(|| definition.clone());
        Ok(Arc::new(StyleSheet::new(
            index,
            options,
            rules,
            input.clone(),
            source,
            Arc::clone(&self.naming),
            Arc::downgrade(&self.surface),
        )))
    }

    /// Acquires the shared, attached sheet for a definition.
    ///
    /// Pre-built sheets are counted process-wide, whichever engine the
    /// instances using them mount under. See [`SheetCache::acquire`].
    pub fn acquire(
        &self,
        definition: &StyleDefinition,
        options: &SheetOptions,
        input: &StyleInput,
    ) -> Result<Arc<StyleSheet>> {
        lock(self.cache_for(definition)).acquire(self, definition, options, input)
    }

    /// Adds the definition's sheet to a registry once.
    ///
    /// See [`SheetCache::register`].
    pub fn register(&self, definition: &StyleDefinition, registry: &SheetsRegistry) -> Result<bool> {
        lock(self.cache_for(definition)).register(definition, registry)
    }

    /// Releases one reference to a definition's sheet.
    ///
    /// See [`SheetCache::release`].
    pub fn release(&self, definition: &StyleDefinition) -> Result<Released> {
        lock(self.cache_for(definition)).release(definition)
    }

    /// Number of live references to a definition's sheet.
    pub fn ref_count(&self, definition: &StyleDefinition) -> usize {
        lock(self.cache_for(definition)).ref_count(definition)
    }

    /// Number of sheets this engine compiled that are currently in use.
    ///
    /// Pre-built sheets are not included.
    pub fn cached_sheets(&self) -> usize {
        lock(&self.cache).len()
    }

    fn cache_for(&self, definition: &StyleDefinition) -> &Mutex<SheetCache> {
        if definition.as_sheet().is_some() {
            &*PREBUILT_SHEETS
        } else {
            &self.cache
        }
    }
}

impl fmt::Debug for StyleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleEngine")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("attached", &self.surface.len())
            .finish()
    }
}

// Keyed by sheet id, which is unique across engines.
static PREBUILT_SHEETS: Lazy<Mutex<SheetCache>> = Lazy::new(|| Mutex::new(SheetCache::new()));

static DEFAULT_ENGINE: Lazy<Mutex<Arc<StyleEngine>>> =
    Lazy::new(|| Mutex::new(Arc::new(StyleEngine::new())));

/// Returns the process-wide default engine, creating it on first use.
pub fn default_engine() -> Arc<StyleEngine> {
    Arc::clone(&lock(&DEFAULT_ENGINE))
}

/// Replaces the process-wide default engine.
///
/// Sheets already compiled by the previous engine stay with it; instances
/// mounted afterwards resolve to the new one.
pub fn set_default_engine(engine: Arc<StyleEngine>) {
    *lock(&DEFAULT_ENGINE) = engine;
}
