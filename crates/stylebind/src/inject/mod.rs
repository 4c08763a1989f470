//! Wrapper types that bind a style definition to component instances.
//!
//! An [`Injector`] is the wrapper type: created once, at design time, from
//! a definition and [`InjectOptions`]. Each mounted [`Injected`] instance of
//! it holds one reference to the shared sheet for the definition, registers
//! that sheet with the registry in scope, and passes the `classes`, `sheet`
//! and `theme` props to the wrapped component.
//!
//! ```rust
//! use stylebind::{inject, Node, Props, RegistryContext, RuleSet};
//!
//! let button = inject(RuleSet::new().rule("button", [("color", "red")]))
//!     .wrap(|props: &Props| {
//!         let class = props.classes().and_then(|c| c.get("button")).unwrap_or("");
//!         Node::text(class)
//!     });
//!
//! let mut instance = button.instantiate(Props::new());
//! instance.mount(&RegistryContext::defaults()).unwrap();
//! assert!(instance.render().unwrap().to_text().starts_with("button-"));
//! instance.unmount().unwrap();
//! ```
//!
//! # Indices
//!
//! Without an explicit `index`, the wrapper draws one from the allocator
//! when it is created, not when it mounts. Wrappers created earlier
//! therefore sort first in every registry, whatever order they mount in.
//!
//! # Redefinition
//!
//! [`Injector::redefine`] and [`Injector::hot_swap_from`] replace the
//! definition of a live wrapper type. Mounted instances pick the change up
//! on their next update: they acquire the new sheet, then release the old
//! one.

mod instance;
mod props;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::{SheetOptions, StyleEngine};
use crate::error::StyleError;
use crate::host::{Component, Element};
use crate::index::{next_index, IndexAllocator};
use crate::style::StyleDefinition;
use crate::util::lock;

pub use instance::Injected;
pub use props::{PropValue, Props, CLASSES, SHEET, THEME};

/// Per-wrapper configuration. Fixed once the wrapper type is created.
///
/// ```rust
/// use stylebind::InjectOptions;
///
/// let options = InjectOptions::from_yaml("index: 10\nmedia: print\n").unwrap();
/// assert_eq!(options.index, Some(10));
/// assert_eq!(options.media.as_deref(), Some("print"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InjectOptions {
    /// Explicit ordering index. Drawn from the allocator when unset.
    pub index: Option<i64>,
    /// Debugging label attached to the sheet.
    pub meta: Option<String>,
    /// Media query the sheet is wrapped in.
    pub media: Option<String>,
    /// Props that feed dynamic rules. All plain-value props when unset.
    pub dynamic_props: Option<Vec<String>>,
    /// Metadata passed through to the sheet untouched.
    pub extra: Map<String, Value>,
}

impl InjectOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the index.
    pub fn index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    /// Sets the debugging label.
    pub fn meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    /// Sets the media query.
    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    /// Restricts dynamic input to the named props.
    pub fn dynamic_props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dynamic_props = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Adds pass-through metadata.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Parses options from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, StyleError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads options from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StyleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StyleError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    fn sheet_options(&self, index: Option<i64>) -> SheetOptions {
        SheetOptions {
            index,
            meta: self.meta.clone(),
            media: self.media.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Creates wrapper types, optionally bound to an engine or allocator.
///
/// Without an engine, instances compile with the engine of the context
/// they mount in.
#[derive(Debug, Clone, Default)]
pub struct InjectorFactory {
    engine: Option<Arc<StyleEngine>>,
    allocator: Option<Arc<IndexAllocator>>,
}

impl InjectorFactory {
    /// A factory using the context engine and the global allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins every wrapper created by this factory to `engine`.
    pub fn with_engine(mut self, engine: Arc<StyleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Draws default indices from `allocator` instead of the global one.
    pub fn with_allocator(mut self, allocator: Arc<IndexAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    /// Starts a wrapper type for `definition`.
    pub fn inject(&self, definition: impl Into<StyleDefinition>, options: InjectOptions) -> Injection {
        self.create_injector(Some(definition.into()), options)
    }

    /// Starts a wrapper type, with or without a definition.
    ///
    /// A definition-less wrapper acquires nothing and still forwards props.
    pub fn create_injector(&self, definition: Option<StyleDefinition>, options: InjectOptions) -> Injection {
        let index = match &definition {
            Some(def) if def.as_sheet().is_none() => Some(options.index.unwrap_or_else(|| self.allocate())),
            _ => options.index,
        };
        Injection {
            engine: self.engine.clone(),
            styles: Styles {
                sheet_options: options.sheet_options(index),
                definition,
            },
            options,
        }
    }

    fn allocate(&self) -> i64 {
        match &self.allocator {
            Some(allocator) => allocator.allocate(),
            None => next_index(),
        }
    }
}

/// Starts a wrapper type for `definition` with default options.
pub fn inject(definition: impl Into<StyleDefinition>) -> Injection {
    InjectorFactory::new().inject(definition, InjectOptions::default())
}

/// Starts a wrapper type for `definition` with `options`.
pub fn inject_with(definition: impl Into<StyleDefinition>, options: InjectOptions) -> Injection {
    InjectorFactory::new().inject(definition, options)
}

/// Starts a wrapper type, with or without a definition.
pub fn create_injector(definition: Option<StyleDefinition>, options: InjectOptions) -> Injection {
    InjectorFactory::new().create_injector(definition, options)
}

/// A wrapper type waiting for its target component.
#[must_use = "call `wrap` or `container` to get a wrapper type"]
#[derive(Debug)]
pub struct Injection {
    engine: Option<Arc<StyleEngine>>,
    options: InjectOptions,
    styles: Styles,
}

impl Injection {
    /// Wraps `component`, which receives the injected props.
    pub fn wrap(self, component: impl Component + 'static) -> Injector {
        self.finish(Some(Arc::new(component)))
    }

    /// Builds a wrapper without a target; it renders its children.
    pub fn container(self) -> Injector {
        self.finish(None)
    }

    fn finish(self, target: Option<Arc<dyn Component>>) -> Injector {
        Injector {
            inner: Arc::new(InjectorInner {
                target,
                engine: self.engine,
                options: self.options,
                styles: Mutex::new(self.styles),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Styles {
    pub(crate) definition: Option<StyleDefinition>,
    pub(crate) sheet_options: SheetOptions,
}

struct InjectorInner {
    target: Option<Arc<dyn Component>>,
    engine: Option<Arc<StyleEngine>>,
    options: InjectOptions,
    styles: Mutex<Styles>,
}

/// A wrapper type. Cloning yields another handle to the same type.
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Injector {
    /// The current definition.
    pub fn definition(&self) -> Option<StyleDefinition> {
        lock(&self.inner.styles).definition.clone()
    }

    /// Options the wrapper was created with.
    pub fn options(&self) -> &InjectOptions {
        &self.inner.options
    }

    /// The index sheets of this wrapper are ordered by.
    pub fn index(&self) -> Option<i64> {
        let styles = lock(&self.inner.styles);
        match styles.definition.as_ref().and_then(|d| d.as_sheet()) {
            Some(sheet) => Some(sheet.index()),
            None => styles.sheet_options.index,
        }
    }

    /// The engine this wrapper is pinned to, if any.
    pub fn engine(&self) -> Option<&Arc<StyleEngine>> {
        self.inner.engine.as_ref()
    }

    /// Returns true if there is no target component.
    pub fn is_container(&self) -> bool {
        self.inner.target.is_none()
    }

    /// Replaces the definition. The index is kept.
    pub fn redefine(&self, definition: impl Into<StyleDefinition>) {
        let definition = definition.into();
        debug!(key = %definition.key(), "redefined wrapper styles");
        lock(&self.inner.styles).definition = Some(definition);
    }

    /// Takes the definition and sheet options of another wrapper type, as a
    /// hot reload of this one.
    pub fn hot_swap_from(&self, other: &Injector) {
        if self.same(other) {
            return;
        }
        let styles = other.styles();
        debug!(index = ?styles.sheet_options.index, "hot-swapped wrapper styles");
        *lock(&self.inner.styles) = styles;
    }

    /// Creates an unmounted instance.
    pub fn instantiate(&self, props: Props) -> Injected {
        Injected::new(self.clone(), props)
    }

    /// Creates an element for a mount point.
    pub fn element(&self, props: Props) -> Element {
        Element::new(self.clone(), props)
    }

    /// Returns true if both handles refer to the same wrapper type.
    pub fn same(&self, other: &Injector) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn styles(&self) -> Styles {
        lock(&self.inner.styles).clone()
    }

    pub(crate) fn target(&self) -> Option<&Arc<dyn Component>> {
        self.inner.target.as_ref()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("definition", &self.definition())
            .field("index", &self.index())
            .field("container", &self.is_container())
            .finish()
    }
}
