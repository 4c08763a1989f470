//! Reference-counted sheet sharing.
//!
//! The [`SheetCache`] guarantees at most one sheet per definition within an
//! engine. Every mounted wrapper instance holds exactly one reference to the
//! entry for its definition:
//!
//! 1. The first [`acquire`](SheetCache::acquire) compiles the sheet, attaches
//!    it and stores it with a count of one.
//! 2. Later acquisitions bump the count and return the same sheet.
//! 3. [`release`](SheetCache::release) drops the count. At zero the sheet is
//!    detached, removed from every registry the cache added it to, and the
//!    entry is evicted.
//!
//! Pre-built sheets go through the same counting, so they are attached while
//! in use and detached afterwards, but the cache never compiles or discards
//! them. The caller keeps its handle and can mount it again. Engines count
//! pre-built sheets in one process-wide cache, so instances mounted under
//! different engines still share a single count.
//!
//! Release is synchronous and deterministic: it happens exactly when the last
//! instance unmounts, never on a collector's schedule.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::engine::{SheetOptions, StyleEngine, StyleSheet};
use crate::error::{Result, SheetError};
use crate::registry::SheetsRegistry;
use crate::style::{DefinitionKey, StyleDefinition, StyleInput};

/// Outcome of a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released {
    /// Other instances still hold the sheet.
    Retained {
        /// References left.
        refs: usize,
    },
    /// That was the last reference; the sheet is detached and evicted.
    Detached,
}

struct Membership {
    registry: SheetsRegistry,
    generation: u64,
}

struct CacheEntry {
    // Held so the key's address cannot be reused while the entry lives.
    _definition: StyleDefinition,
    sheet: Arc<StyleSheet>,
    refs: usize,
    memberships: Vec<Membership>,
}

/// Map from definition identity to a shared, counted sheet.
#[derive(Default)]
pub struct SheetCache {
    entries: HashMap<DefinitionKey, CacheEntry>,
}

impl SheetCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sheet for `definition`, compiling and attaching it on
    /// first use, and takes one reference.
    ///
    /// `options` and `input` only matter for the first acquisition.
    ///
    /// # Errors
    ///
    /// Propagates compilation errors; no reference is taken in that case.
    pub fn acquire(
        &mut self,
        engine: &StyleEngine,
        definition: &StyleDefinition,
        options: &SheetOptions,
        input: &StyleInput,
    ) -> Result<Arc<StyleSheet>> {
        let key = definition.key();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.refs += 1;
            trace!(%key, refs = entry.refs, "sheet cache hit");
            return Ok(Arc::clone(&entry.sheet));
        }

        let sheet = engine.compile(definition, input, options.clone())?;
        sheet.attach();
        debug!(%key, sheet = %sheet.id(), index = sheet.index(), "acquired new sheet");
        self.entries.insert(
            key,
            CacheEntry {
                _definition: definition.clone(),
                sheet: Arc::clone(&sheet),
                refs: 1,
                memberships: Vec::new(),
            },
        );
        Ok(sheet)
    }

    /// Adds the definition's sheet to `registry` unless it is already there.
    ///
    /// Returns true if this call added it; the cache then removes it again
    /// when the count reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::NotAcquired`] if no reference is held.
    pub fn register(&mut self, definition: &StyleDefinition, registry: &SheetsRegistry) -> Result<bool> {
        let key = definition.key();
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or(SheetError::NotAcquired { key })?;
        match registry.add_tracked(&entry.sheet) {
            Some(generation) => {
                entry.memberships.retain(|m| !m.registry.same(registry));
                entry.memberships.push(Membership {
                    registry: registry.clone(),
                    generation,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drops one reference.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::RefCountUnderflow`] if no reference is held,
    /// and [`SheetError::NotRegistered`] if a registry lost the sheet
    /// without being reset. The entry is evicted and the sheet detached
    /// before the latter is reported.
    pub fn release(&mut self, definition: &StyleDefinition) -> Result<Released> {
        let key = definition.key();
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or(SheetError::RefCountUnderflow { key })?;
        entry.refs -= 1;
        if entry.refs > 0 {
            trace!(%key, refs = entry.refs, "released sheet reference");
            return Ok(Released::Retained { refs: entry.refs });
        }

        let Some(entry) = self.entries.remove(&key) else {
            return Err(SheetError::RefCountUnderflow { key });
        };
        entry.sheet.detach();
        debug!(%key, sheet = %entry.sheet.id(), "released last reference");

        let mut first_error = None;
        for membership in &entry.memberships {
            if let Err(err) = membership
                .registry
                .remove_tracked(&entry.sheet, membership.generation)
            {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(Released::Detached),
        }
    }

    /// Number of references held for a definition.
    pub fn ref_count(&self, definition: &StyleDefinition) -> usize {
        self.entries
            .get(&definition.key())
            .map_or(0, |entry| entry.refs)
    }

    /// The cached sheet for a definition, if any.
    pub fn sheet(&self, definition: &StyleDefinition) -> Option<Arc<StyleSheet>> {
        self.entries
            .get(&definition.key())
            .map(|entry| Arc::clone(&entry.sheet))
    }

    /// Number of cached sheets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
