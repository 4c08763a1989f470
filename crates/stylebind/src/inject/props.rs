//! Props passed to wrapped components.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::{Classes, StyleSheet};
use crate::host::Node;
use crate::theme::Theme;

/// Prop name of the rule-name to class-name mapping.
pub const CLASSES: &str = "classes";
/// Prop name of the acquired sheet.
pub const SHEET: &str = "sheet";
/// Prop name of the theme in scope.
pub const THEME: &str = "theme";

/// A single prop value.
#[derive(Debug, Clone)]
pub enum PropValue {
    /// A class mapping.
    Classes(Classes),
    /// A sheet handle.
    Sheet(Arc<StyleSheet>),
    /// A theme.
    Theme(Theme),
    /// Any plain value.
    Value(Value),
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Classes(a), PropValue::Classes(b)) => a == b,
            (PropValue::Sheet(a), PropValue::Sheet(b)) => Arc::ptr_eq(a, b),
            (PropValue::Theme(a), PropValue::Theme(b)) => a == b,
            (PropValue::Value(a), PropValue::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Classes> for PropValue {
    fn from(classes: Classes) -> Self {
        PropValue::Classes(classes)
    }
}

impl From<Arc<StyleSheet>> for PropValue {
    fn from(sheet: Arc<StyleSheet>) -> Self {
        PropValue::Sheet(sheet)
    }
}

impl From<Theme> for PropValue {
    fn from(theme: Theme) -> Self {
        PropValue::Theme(theme)
    }
}

impl From<Value> for PropValue {
    fn from(value: Value) -> Self {
        PropValue::Value(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Value(Value::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Value(Value::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Value(Value::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Value(Value::from(value))
    }
}

/// Named props plus children.
#[derive(Debug, Clone, Default)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
    children: Vec<Node>,
}

impl Props {
    /// Creates empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a prop, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds a child, builder style.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Replaces the children, builder style.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children = children.into_iter().collect();
        self
    }

    /// Sets a prop.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up a prop.
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    /// Returns true if the prop is set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// All props in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The `classes` prop, if it holds a class mapping.
    pub fn classes(&self) -> Option<&Classes> {
        match self.get(CLASSES) {
            Some(PropValue::Classes(classes)) => Some(classes),
            _ => None,
        }
    }

    /// The `sheet` prop, if it holds a sheet.
    pub fn sheet(&self) -> Option<&Arc<StyleSheet>> {
        match self.get(SHEET) {
            Some(PropValue::Sheet(sheet)) => Some(sheet),
            _ => None,
        }
    }

    /// The `theme` prop, if it holds a theme.
    pub fn theme(&self) -> Option<&Theme> {
        match self.get(THEME) {
            Some(PropValue::Theme(theme)) => Some(theme),
            _ => None,
        }
    }

    /// A plain-value prop.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name) {
            Some(PropValue::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Plain-value props, restricted to `names` when given.
    pub(crate) fn values_for(&self, names: Option<&[String]>) -> serde_json::Map<String, Value> {
        self.values
            .iter()
            .filter(|(name, _)| names.map_or(true, |names| names.iter().any(|n| n == *name)))
            .filter_map(|(name, value)| match value {
                PropValue::Value(v) => Some((name.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    /// Children passed to the element.
    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values && self.children == other.children
    }
}
