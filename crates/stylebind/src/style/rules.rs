//! Rule sets: the static shape of a style definition.
//!
//! A [`RuleSet`] maps rule names to ordered declarations. Rule names become
//! the keys of the generated `classes` mapping, so they must be identifiers.
//!
//! Rule sets can be built programmatically or parsed from YAML. YAML mapping
//! order is kept, which also fixes the order of rules in the rendered text.
//!
//! ```rust
//! use stylebind::RuleSet;
//!
//! let built = RuleSet::new().rule("button", [("color", "red"), ("margin", "0")]);
//!
//! let parsed = RuleSet::from_yaml(r#"
//! button:
//!   color: red
//!   margin: 0
//! "#).unwrap();
//!
//! assert_eq!(built, parsed);
//! ```

use std::path::Path;

use serde_yaml::Value;

use crate::error::StyleError;
use crate::util::is_identifier;

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// CSS property name, passed through as written.
    pub property: String,
    /// CSS value, passed through as written.
    pub value: String,
}

/// A named block of declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    declarations: Vec<Declaration>,
}

impl Rule {
    /// The rule name (the key of the `classes` mapping).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in definition order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}

/// An ordered collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, returning `self` for chaining.
    ///
    /// Adding a rule whose name already exists replaces its declarations in
    /// place, keeping its original position.
    pub fn rule<I, K, V>(mut self, name: impl Into<String>, declarations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let declarations = declarations
            .into_iter()
            .map(|(property, value)| Declaration {
                property: property.into(),
                value: value.into(),
            })
            .collect();
        match self.rules.iter_mut().find(|r| r.name == name) {
            Some(existing) => existing.declarations = declarations,
            None => self.rules.push(Rule { name, declarations }),
        }
        self
    }

    /// Parses a rule set from YAML.
    ///
    /// The document must be a mapping of rule names to mappings of
    /// properties. Property values may be strings, numbers or booleans.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::Parse`] for malformed YAML and
    /// [`StyleError::InvalidRule`] for structurally wrong rules.
    pub fn from_yaml(yaml: &str) -> Result<Self, StyleError> {
        let root: Value = serde_yaml::from_str(yaml)?;
        let mapping = match root {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Ok(Self::new()),
            _ => {
                return Err(StyleError::Parse(
                    "expected a mapping of rule names".to_string(),
                ))
            }
        };

        let mut rules = Self::new();
        for (key, body) in mapping {
            let name = key.as_str().ok_or_else(|| StyleError::Parse(
                "rule names must be strings".to_string(),
            ))?;
            let body = match body {
                Value::Mapping(body) => body,
                _ => {
                    return Err(StyleError::InvalidRule {
                        rule: name.to_string(),
                        message: "expected a mapping of properties".to_string(),
                    })
                }
            };
            let mut declarations = Vec::with_capacity(body.len());
            for (property, value) in body {
                let property = property.as_str().ok_or_else(|| StyleError::InvalidRule {
                    rule: name.to_string(),
                    message: "property names must be strings".to_string(),
                })?;
                let value = scalar_to_string(&value).ok_or_else(|| StyleError::InvalidRule {
                    rule: name.to_string(),
                    message: format!("property '{}' must have a scalar value", property),
                })?;
                declarations.push((property.to_string(), value));
            }
            rules = rules.rule(name, declarations);
        }
        rules.validate()?;
        Ok(rules)
    }

    /// Loads a rule set from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StyleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StyleError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Checks rule names and declarations.
    ///
    /// # Errors
    ///
    /// Returns [`StyleError::InvalidRule`] for the first rule whose name is
    /// not an identifier, or that has an empty property or value.
    pub fn validate(&self) -> Result<(), StyleError> {
        for rule in &self.rules {
            if !is_identifier(&rule.name) {
                return Err(StyleError::InvalidRule {
                    rule: rule.name.clone(),
                    message: "rule names must match [A-Za-z_][A-Za-z0-9_-]*".to_string(),
                });
            }
            for decl in &rule.declarations {
                if decl.property.trim().is_empty() {
                    return Err(StyleError::InvalidRule {
                        rule: rule.name.clone(),
                        message: "empty property name".to_string(),
                    });
                }
                if decl.value.trim().is_empty() {
                    return Err(StyleError::InvalidRule {
                        rule: rule.name.clone(),
                        message: format!("empty value for '{}'", decl.property),
                    });
                }
            }
        }
        Ok(())
    }

    /// Looks up a rule by name.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Rule names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.name.as_str())
    }

    /// Iterates over rules in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
