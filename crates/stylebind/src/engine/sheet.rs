//! Compiled stylesheets.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::StyleError;
use crate::style::{RuleSet, StyleDefinition, StyleInput};
use crate::util::lock;

use super::naming::ClassNameGenerator;
use super::surface::Surface;
use super::EngineId;

static NEXT_SHEET_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a compiled sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(u64);

impl SheetId {
    fn next() -> Self {
        SheetId(NEXT_SHEET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// Options a sheet is compiled with.
///
/// `index` orders the sheet on the surface and in registries. Left unset,
/// the engine draws one from the global index allocator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetOptions {
    /// Ordering index; lower sorts first.
    pub index: Option<i64>,
    /// Free-form label, useful when debugging.
    pub meta: Option<String>,
    /// Media query wrapping the whole sheet.
    pub media: Option<String>,
    /// Pass-through metadata.
    pub extra: Map<String, Value>,
}

impl SheetOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit index.
    pub fn index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    /// Sets the meta label.
    pub fn meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    /// Sets the media query.
    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// Mapping from rule name to generated class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classes(BTreeMap<String, String>);

impl Classes {
    /// Looks up the class generated for a rule.
    pub fn get(&self, rule: &str) -> Option<&str> {
        self.0.get(rule).map(|s| s.as_str())
    }

    /// Rule names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// `(rule, class)` pairs, sorted by rule.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Classes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Classes(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

struct SheetState {
    rules: RuleSet,
    classes: BTreeMap<String, String>,
    attached: bool,
    // The input the rules were last computed from.
    input: StyleInput,
}

/// A compiled stylesheet.
///
/// Sheets are shared as `Arc<StyleSheet>`. Attach state, rules and classes
/// live behind a lock so a shared sheet can be updated in place.
pub struct StyleSheet {
    id: SheetId,
    engine_id: EngineId,
    index: i64,
    options: SheetOptions,
    source: Option<StyleDefinition>,
    naming: Arc<ClassNameGenerator>,
    surface: Weak<Surface>,
    state: Mutex<SheetState>,
}

impl StyleSheet {
    pub(crate) fn new(
        index: i64,
        options: SheetOptions,
        rules: RuleSet,
        input: StyleInput,
        source: Option<StyleDefinition>,
        naming: Arc<ClassNameGenerator>,
        surface: Weak<Surface>,
    ) -> Self {
        let classes = naming.assign(&rules, &BTreeMap::new());
        Self {
            id: SheetId::next(),
            engine_id: naming.engine_id(),
            index,
            options: SheetOptions {
                index: Some(index),
                ..options
            },
            source,
            naming,
            surface,
            state: Mutex::new(SheetState {
                rules,
                classes,
                attached: false,
                input,
            }),
        }
    }

    /// Identity of this sheet.
    pub fn id(&self) -> SheetId {
        self.id
    }

    /// The engine that compiled this sheet.
    pub fn engine_id(&self) -> EngineId {
        self.engine_id
    }

    /// Ordering index.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Options the sheet was compiled with; `index` is always set.
    pub fn options(&self) -> &SheetOptions {
        &self.options
    }

    /// Returns true if the rules are recomputed by [`update`](Self::update).
    pub fn is_dynamic(&self) -> bool {
        self.source.is_some()
    }

    /// Current rule-name to class-name mapping.
    pub fn classes(&self) -> Classes {
        Classes(lock(&self.state).classes.clone())
    }

    /// Current rules.
    pub fn rules(&self) -> RuleSet {
        lock(&self.state).rules.clone()
    }

    /// Returns true while the sheet is on its surface.
    pub fn is_attached(&self) -> bool {
        lock(&self.state).attached
    }

    /// Puts the sheet on its engine's surface.
    ///
    /// Returns false if it was already attached or the surface is gone;
    /// neither is an error.
    pub fn attach(self: &Arc<Self>) -> bool {
        {
            let mut state = lock(&self.state);
            if state.attached {
                return false;
            }
            state.attached = true;
        }
        let inserted = self
            .surface
            .upgrade()
            .is_some_and(|surface| surface.insert(Arc::clone(self)));
        if inserted {
            debug!(sheet = %self.id, index = self.index, "attached sheet");
        } else {
            self.mark_detached();
            warn!(sheet = %self.id, "rendering surface unavailable, sheet left detached");
        }
        inserted
    }

    /// Takes the sheet off its surface.
    ///
    /// Returns false if it was not attached. A surface that is already gone
    /// is tolerated.
    pub fn detach(&self) -> bool {
        {
            let mut state = lock(&self.state);
            if !state.attached {
                return false;
            }
            state.attached = false;
        }
        match self.surface.upgrade() {
            Some(surface) if surface.remove(self.id) => {
                debug!(sheet = %self.id, "detached sheet");
            }
            _ => warn!(sheet = %self.id, "sheet was no longer on its surface"),
        }
        true
    }

    pub(crate) fn mark_detached(&self) {
        lock(&self.state).attached = false;
    }

    /// Recomputes dynamic rules in place.
    ///
    /// Nothing is recomputed when `input` equals the input the rules were
    /// last computed from, whoever supplied it. The sheet keeps its
    /// identity, attach state and class names for rules that still exist.
    /// Static sheets ignore updates. Returns true if the rules changed.
    ///
    /// # Errors
    ///
    /// Propagates [`StyleError`] from evaluating or validating the rules.
    /// The previous rules and input stay in place.
    pub fn update(&self, input: &StyleInput) -> Result<bool, StyleError> {
        let Some(source) = &self.source else {
            return Ok(false);
        };
        if lock(&self.state).input == *input {
            return Ok(false);
        }
        let rules = source.rules(input)?;
        rules.validate()?;

        let mut state = lock(&self.state);
        state.input = input.clone();
        if state.rules == rules {
            return Ok(false);
        }
        state.classes = self.naming.assign(&rules, &state.classes);
        state.rules = rules;
        debug!(sheet = %self.id, "updated dynamic rules");
        Ok(true)
    }

    /// Renders the sheet as CSS text.
    pub fn to_css(&self) -> String {
        let state = lock(&self.state);
        let body = state
            .rules
            .iter()
            .map(|rule| {
                let class = state
                    .classes
                    .get(rule.name())
                    .map(|s| s.as_str())
                    .unwrap_or(rule.name());
                let declarations: String = rule
                    .declarations()
                    .iter()
                    .map(|d| format!("  {}: {};\n", d.property, d.value))
                    .collect();
                format!(".{} {{\n{}}}", class, declarations)
            })
            .collect::<Vec<_>>()
            .join("\n");
        match &self.options.media {
            Some(media) => format!("@media {} {{\n{}\n}}", media, body),
            None => body,
        }
    }
}

impl fmt::Debug for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleSheet")
            .field("id", &self.id)
            .field("engine_id", &self.engine_id)
            .field("index", &self.index)
            .field("dynamic", &self.is_dynamic())
            .field("attached", &self.is_attached())
            .finish()
    }
}
