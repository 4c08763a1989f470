//! # Stylebind - Stylesheet Lifecycle for Component Trees
//!
//! `stylebind` ties compiled stylesheets to the mount lifecycle of the
//! components that use them. It decides when a sheet is created, shared,
//! updated, reordered and destroyed while many component instances come and
//! go.
//!
//! ## Core Concepts
//!
//! - [`StyleDefinition`]: static rules, a function of theme and props, or a
//!   pre-built sheet. Identity, not content, decides sharing.
//! - [`StyleEngine`]: compiles definitions into [`StyleSheet`]s, owns the
//!   rendering [`Surface`] and the reference-counted [`SheetCache`]
//! - [`SheetsRegistry`]: ordered collection of sheets for bulk extraction
//! - [`RegistryContext`]: the registry, engine and theme in scope, set by
//!   [providers](context)
//! - [`Injector`]: a wrapper type created by [`inject`]. Its [`Injected`]
//!   instances acquire the shared sheet on mount and release it on unmount.
//! - [`MountPoint`]: a minimal host that renders wrapper elements
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stylebind::{inject, MountPoint, Node, Props, RegistryContext, RuleSet, SheetsRegistry, StyleEngine};
//!
//! let styles = RuleSet::new()
//!     .rule("button", [("color", "white"), ("background", "steelblue")]);
//!
//! let button = inject(styles).wrap(|props: &Props| {
//!     let class = props.classes().and_then(|c| c.get("button")).unwrap_or_default();
//!     Node::text(format!("<button class=\"{class}\">"))
//! });
//!
//! let engine = Arc::new(StyleEngine::new());
//! let registry = SheetsRegistry::new();
//! let mut root = MountPoint::with_context(RegistryContext::new(registry.clone(), Arc::clone(&engine)));
//!
//! let html = root.render(button.element(Props::new())).unwrap().to_text();
//! assert!(html.starts_with("<button class=\"button-"));
//! assert_eq!(engine.surface().len(), 1);
//! assert!(registry.to_css().contains("background: steelblue"));
//!
//! root.unmount().unwrap();
//! assert!(engine.surface().is_empty());
//! ```
//!
//! ## Sharing
//!
//! All instances built from the same definition share one sheet, even
//! across wrapper types. The sheet is attached on the first mount and
//! detached when the last instance unmounts. Two definitions with equal
//! rules are still two sheets.
//!
//! ## Ordering
//!
//! Sheets are ordered by index. Wrappers created without an explicit index
//! get an increasing negative one at creation time, so program order is
//! registry order, and explicit non-negative indices always sort after.
//!
//! ## Dynamic Styles
//!
//! ```rust
//! use stylebind::{inject_with, InjectOptions, MountPoint, Props, RuleSet, StyleDefinition};
//!
//! let styles = StyleDefinition::dynamic(|input| {
//!     let color = input.prop("color").and_then(|v| v.as_str()).unwrap_or("black");
//!     RuleSet::new().rule("label", [("color", color)])
//! });
//! let label = inject_with(styles, InjectOptions::new().dynamic_props(["color"])).container();
//!
//! let mut root = MountPoint::new();
//! root.render(label.element(Props::new().with("color", "red"))).unwrap();
//! let sheet = root.instance().and_then(|i| i.sheet()).unwrap();
//!
//! root.render(label.element(Props::new().with("color", "blue"))).unwrap();
//! assert!(sheet.is_attached());
//! assert!(sheet.to_css().contains("color: blue"));
//! root.unmount().unwrap();
//! ```

mod cache;
pub mod context;
pub mod engine;
mod error;
pub mod host;
mod index;
pub mod inject;
pub mod prelude;
mod registry;
pub mod style;
pub mod theme;
mod util;

// Errors
pub use error::{Result, SheetError, StyleError};

// Definitions
pub use style::{Declaration, DefinitionKey, Rule, RuleSet, StyleDefinition, StyleInput};
pub use theme::Theme;

// Engine
pub use cache::{Released, SheetCache};
pub use engine::{
    default_engine, set_default_engine, Classes, EngineConfig, EngineId, SheetId, SheetOptions,
    StyleEngine, StyleSheet, Surface,
};

// Ordering
pub use index::{next_index, IndexAllocator, INDEX_FLOOR};
pub use registry::{default_registry, SheetsRegistry};

// Context
pub use context::{
    ContextProvider, EngineProvider, RegistryContext, SheetsRegistryProvider, ThemeProvider,
};

// Injection
pub use inject::{
    create_injector, inject, inject_with, InjectOptions, Injected, Injection, Injector,
    InjectorFactory, PropValue, Props,
};

// Host
pub use host::{Component, Element, MountPoint, Node};
