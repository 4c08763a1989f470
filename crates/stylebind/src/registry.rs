//! Ordered sheet registries for bulk extraction.
//!
//! A [`SheetsRegistry`] collects the sheets mounted under it so a host can
//! enumerate them independently of the rendering surface. The typical use
//! is server-side rendering: mount a tree under a fresh registry, then emit
//! [`to_css`](SheetsRegistry::to_css) into the page.
//!
//! # Ordering
//!
//! Sheets are kept in ascending `index` order. Sheets with equal indices keep
//! the order they were added in; this is a guarantee, not an accident of the
//! storage.
//!
//! # Resets
//!
//! [`reset`](SheetsRegistry::reset) empties the registry without touching
//! attach state. Memberships recorded before a reset are forgotten: when the
//! last user of such a sheet unmounts, the sheet is not removed a second time.
//!
//! # Example
//!
//! ```rust
//! use stylebind::{inject, MountPoint, RegistryContext, RuleSet, SheetsRegistry, StyleEngine};
//! use std::sync::Arc;
//!
//! let registry = SheetsRegistry::new();
//! let context = RegistryContext::new(registry.clone(), Arc::new(StyleEngine::new()));
//!
//! let wrapper = inject(RuleSet::new().rule("button", [("color", "red")])).container();
//! let mut root = MountPoint::with_context(context);
//! root.render(wrapper.element(Default::default())).unwrap();
//!
//! assert_eq!(registry.len(), 1);
//! assert!(registry.to_css().contains("color: red"));
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::trace;

use crate::engine::StyleSheet;
use crate::error::{Result, SheetError};
use crate::util::{insertion_point, lock};

#[derive(Default)]
struct RegistryState {
    sheets: Vec<Arc<StyleSheet>>,
    generation: u64,
}

/// An ordered collection of sheet handles.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct SheetsRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl SheetsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet at its index position.
    ///
    /// Returns false, leaving the registry unchanged, if the sheet is
    /// already present.
    pub fn add(&self, sheet: &Arc<StyleSheet>) -> bool {
        self.add_tracked(sheet).is_some()
    }

    /// Adds a sheet and returns the generation it was added in, or `None`
    /// if it was already present.
    pub(crate) fn add_tracked(&self, sheet: &Arc<StyleSheet>) -> Option<u64> {
        let mut state = lock(&self.inner);
        if state.sheets.iter().any(|s| Arc::ptr_eq(s, sheet)) {
            return None;
        }
        let at = insertion_point(&state.sheets, sheet.index());
        state.sheets.insert(at, Arc::clone(sheet));
        trace!(sheet = %sheet.id(), position = at, "registered sheet");
        Some(state.generation)
    }

    /// Removes a sheet.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::NotRegistered`] if the sheet is absent. Under
    /// correct reference counting this never happens.
    pub fn remove(&self, sheet: &StyleSheet) -> Result<()> {
        remove_from(&mut lock(&self.inner), sheet)
    }

    /// Removes a sheet added in `generation`. Sheets whose membership was
    /// wiped by a reset since then are skipped.
    pub(crate) fn remove_tracked(&self, sheet: &StyleSheet, generation: u64) -> Result<()> {
        let mut state = lock(&self.inner);
        if state.generation != generation {
            trace!(sheet = %sheet.id(), "registry was reset, skipping removal");
            return Ok(());
        }
        remove_from(&mut state, sheet)
    }

    /// Empties the registry. Attach state is untouched.
    pub fn reset(&self) {
        let mut state = lock(&self.inner);
        state.sheets.clear();
        state.generation += 1;
    }

    /// Number of resets so far.
    pub fn generation(&self) -> u64 {
        lock(&self.inner).generation
    }

    /// Number of registered sheets.
    pub fn len(&self) -> usize {
        lock(&self.inner).sheets.len()
    }

    /// Returns true if no sheets are registered.
    pub fn is_empty(&self) -> bool {
        lock(&self.inner).sheets.is_empty()
    }

    /// Returns true if the sheet is registered.
    pub fn contains(&self, sheet: &StyleSheet) -> bool {
        lock(&self.inner).sheets.iter().any(|s| s.id() == sheet.id())
    }

    /// Registered sheets in order.
    pub fn sheets(&self) -> Vec<Arc<StyleSheet>> {
        lock(&self.inner).sheets.clone()
    }

    /// Indices of the registered sheets, in order.
    pub fn indices(&self) -> Vec<i64> {
        lock(&self.inner).sheets.iter().map(|s| s.index()).collect()
    }

    /// Rendered text of all sheets in registry order, one per line group.
    pub fn to_css(&self) -> String {
        self.sheets()
            .iter()
            .map(|sheet| sheet.to_css())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns true if both handles point at the same registry.
    pub fn same(&self, other: &SheetsRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for SheetsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl fmt::Debug for SheetsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsRegistry")
            .field("indices", &self.indices())
            .field("generation", &self.generation())
            .finish()
    }
}

fn remove_from(state: &mut RegistryState, sheet: &StyleSheet) -> Result<()> {
    match state.sheets.iter().position(|s| s.id() == sheet.id()) {
        Some(at) => {
            state.sheets.remove(at);
            trace!(sheet = %sheet.id(), "unregistered sheet");
            Ok(())
        }
        None => Err(SheetError::NotRegistered { sheet: sheet.id() }),
    }
}

static DEFAULT_REGISTRY: Lazy<SheetsRegistry> = Lazy::new(SheetsRegistry::new);

/// Returns the process-wide default registry, creating it on first use.
pub fn default_registry() -> SheetsRegistry {
    DEFAULT_REGISTRY.clone()
}
