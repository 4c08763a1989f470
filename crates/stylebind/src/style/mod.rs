//! Style definitions: what a wrapper asks the engine to compile.
//!
//! - [`RuleSet`]: ordered rules, built in code or parsed from YAML
//! - [`StyleDefinition`]: static rules, a function of [`StyleInput`], or a
//!   pre-built sheet, with pointer identity for sharing

mod definition;
mod rules;

pub use definition::{DefinitionKey, StyleDefinition, StyleInput};
pub use rules::{Declaration, Rule, RuleSet};
