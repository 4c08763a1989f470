//! Style definitions and their identity.
//!
//! A [`StyleDefinition`] is a cheap-to-clone handle. Clones share identity;
//! two definitions built separately never do, even when their rules are
//! equal. The sheet cache keys on that identity through [`DefinitionKey`].

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::engine::{SheetId, StyleSheet};
use crate::error::StyleError;
use crate::theme::Theme;

use super::rules::RuleSet;

type RuleFn = dyn Fn(&StyleInput) -> RuleSet + Send + Sync;
type ThemedFn = dyn Fn(&Theme, &StyleInput) -> RuleSet + Send + Sync;

/// The dynamic input a definition is evaluated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleInput {
    /// The theme in scope, if any.
    pub theme: Option<Theme>,
    /// Props that feed dynamic rules.
    pub props: Map<String, Value>,
}

impl StyleInput {
    /// Creates an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    /// Sets a prop.
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Looks up a prop.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }
}

/// Identity of a definition, used as the sheet cache key.
///
/// Definitions wrapping a pre-built sheet are keyed by the sheet, so two
/// handles around the same sheet share one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKey {
    /// A compiled definition, keyed by handle address.
    Definition(usize),
    /// A pre-built sheet.
    Sheet(SheetId),
}

impl fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKey::Definition(addr) => write!(f, "definition@{:#x}", addr),
            DefinitionKey::Sheet(id) => write!(f, "pre-built {}", id),
        }
    }
}

enum Source {
    Static(RuleSet),
    Dynamic(Box<RuleFn>),
    Themed(Box<ThemedFn>),
    Sheet(Arc<StyleSheet>),
}

/// A static rule set, a function of dynamic input, or a pre-built sheet.
///
/// ```rust
/// use stylebind::{RuleSet, StyleDefinition, StyleInput};
///
/// let fixed = StyleDefinition::new(RuleSet::new().rule("button", [("color", "red")]));
/// let sized = StyleDefinition::dynamic(|input: &StyleInput| {
///     let size = input.prop("size").and_then(|v| v.as_u64()).unwrap_or(12);
///     RuleSet::new().rule("label", [("font-size", format!("{}px", size))])
/// });
///
/// assert!(fixed.same(&fixed.clone()));
/// assert!(!fixed.same(&sized));
/// assert!(sized.is_dynamic());
/// ```
#[derive(Clone)]
pub struct StyleDefinition {
    source: Arc<Source>,
}

impl StyleDefinition {
    /// Wraps a static rule set.
    pub fn new(rules: RuleSet) -> Self {
        Self::from_source(Source::Static(rules))
    }

    /// Parses a static definition from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, StyleError> {
        Ok(Self::new(RuleSet::from_yaml(yaml)?))
    }

    /// Wraps a function of the dynamic input (theme and props).
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&StyleInput) -> RuleSet + Send + Sync + 'static,
    {
        Self::from_source(Source::Dynamic(Box::new(f)))
    }

    /// Wraps a function that needs a theme.
    ///
    /// Mounting it where no theme is in scope fails with
    /// [`StyleError::ThemeRequired`].
    pub fn themed<F>(f: F) -> Self
    where
        F: Fn(&Theme, &StyleInput) -> RuleSet + Send + Sync + 'static,
    {
        Self::from_source(Source::Themed(Box::new(f)))
    }

    /// Wraps a sheet compiled by the caller.
    ///
    /// The sheet is attached while mounted instances use it and detached
    /// after the last one unmounts. It is never recompiled or discarded.
    pub fn sheet(sheet: Arc<StyleSheet>) -> Self {
        Self::from_source(Source::Sheet(sheet))
    }

    fn from_source(source: Source) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// The cache key for this definition.
    pub fn key(&self) -> DefinitionKey {
        match &*self.source {
            Source::Sheet(sheet) => DefinitionKey::Sheet(sheet.id()),
            _ => DefinitionKey::Definition(Arc::as_ptr(&self.source) as *const () as usize),
        }
    }

    /// Returns true if both handles resolve to the same cache key.
    pub fn same(&self, other: &StyleDefinition) -> bool {
        self.key() == other.key()
    }

    /// Returns true if the rules depend on the dynamic input.
    pub fn is_dynamic(&self) -> bool {
        matches!(&*self.source, Source::Dynamic(_) | Source::Themed(_))
    }

    /// Returns true if evaluating the rules needs a theme.
    pub fn requires_theme(&self) -> bool {
        matches!(&*self.source, Source::Themed(_))
    }

    /// Returns the pre-built sheet, if this definition wraps one.
    pub fn as_sheet(&self) -> Option<&Arc<StyleSheet>> {
        match &*self.source {
            Source::Sheet(sheet) => Some(sheet),
            _ => None,
        }
    }

    /// Evaluates the rules for the given input.
    ///
    /// For a pre-built sheet this returns the sheet's current rules.
    pub fn rules(&self, input: &StyleInput) -> Result<RuleSet, StyleError> {
        match &*self.source {
            Source::Static(rules) => Ok(rules.clone()),
            Source::Dynamic(f) => Ok(f(input)),
            Source::Themed(f) => {
                let theme = input.theme.as_ref().ok_or(StyleError::ThemeRequired)?;
                Ok(f(theme, input))
            }
            Source::Sheet(sheet) => Ok(sheet.rules()),
        }
    }
}

impl From<RuleSet> for StyleDefinition {
    fn from(rules: RuleSet) -> Self {
        Self::new(rules)
    }
}

impl From<Arc<StyleSheet>> for StyleDefinition {
    fn from(sheet: Arc<StyleSheet>) -> Self {
        Self::sheet(sheet)
    }
}

impl fmt::Debug for StyleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.source {
            Source::Static(_) => "static",
            Source::Dynamic(_) => "dynamic",
            Source::Themed(_) => "themed",
            Source::Sheet(_) => "sheet",
        };
        f.debug_struct("StyleDefinition")
            .field("key", &self.key())
            .field("kind", &kind)
            .finish()
    }
}
