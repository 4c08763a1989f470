//! Scoped propagation of the active registry, engine and theme.
//!
//! Wrapper instances resolve a [`RegistryContext`] when they mount. The
//! context comes from the nearest enclosing provider, or from the
//! process-wide defaults when no provider is active.
//!
//! # Providers
//!
//! A provider overrides one part of the context for the duration of a
//! closure. Providers nest; each one starts from the context in scope and
//! the previous context is restored when the closure returns, even by
//! unwinding.
//!
//! - [`SheetsRegistryProvider`]: the registry sheets get added to
//! - [`EngineProvider`]: the engine sheets get compiled by
//! - [`ThemeProvider`]: the theme passed to themed definitions
//!
//! A blanket implementation lets closures act as providers too.
//!
//! # Example
//!
//! ```rust
//! use stylebind::context::{ContextProvider, SheetsRegistryProvider};
//! use stylebind::{RegistryContext, SheetsRegistry};
//!
//! let registry = SheetsRegistry::new();
//! let resolved = SheetsRegistryProvider::new(registry.clone())
//!     .provide(|| RegistryContext::current());
//!
//! assert!(resolved.registry().same(&registry));
//! ```

use std::cell::RefCell;
use std::sync::Arc;

use crate::engine::{default_engine, StyleEngine};
use crate::registry::{default_registry, SheetsRegistry};
use crate::theme::Theme;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<RegistryContext>> = const { RefCell::new(Vec::new()) };
}

/// The registry, engine and theme a wrapper instance mounts against.
#[derive(Debug, Clone)]
pub struct RegistryContext {
    registry: SheetsRegistry,
    engine: Arc<StyleEngine>,
    theme: Option<Theme>,
}

impl RegistryContext {
    /// Creates a context with an explicit registry and engine.
    pub fn new(registry: SheetsRegistry, engine: Arc<StyleEngine>) -> Self {
        Self {
            registry,
            engine,
            theme: None,
        }
    }

    /// The process-wide default registry and engine, without a theme.
    pub fn defaults() -> Self {
        Self::new(default_registry(), default_engine())
    }

    /// The context of the innermost active provider, or the defaults.
    pub fn current() -> Self {
        CONTEXT_STACK
            .with(|stack| stack.borrow().last().cloned())
            .unwrap_or_else(Self::defaults)
    }

    /// Replaces the registry.
    pub fn with_registry(mut self, registry: SheetsRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the engine.
    pub fn with_engine(mut self, engine: Arc<StyleEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    /// The registry sheets get added to.
    pub fn registry(&self) -> &SheetsRegistry {
        &self.registry
    }

    /// The engine sheets get compiled by.
    pub fn engine(&self) -> &Arc<StyleEngine> {
        &self.engine
    }

    /// The theme in scope, if any.
    pub fn theme(&self) -> Option<&Theme> {
        self.theme.as_ref()
    }

    /// Makes this context current while `f` runs.
    pub fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(self));
        let _guard = ScopeGuard;
        f()
    }
}

struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Something that derives a child context from the one in scope.
pub trait ContextProvider {
    /// Produces the context for the provider's subtree.
    fn apply(&self, parent: RegistryContext) -> RegistryContext;

    /// Runs `f` with the derived context current.
    fn provide<R>(&self, f: impl FnOnce() -> R) -> R
    where
        Self: Sized,
    {
        self.apply(RegistryContext::current()).scope(f)
    }
}

impl<F> ContextProvider for F
where
    F: Fn(RegistryContext) -> RegistryContext,
{
    fn apply(&self, parent: RegistryContext) -> RegistryContext {
        (self)(parent)
    }
}

/// Scopes a registry to a subtree.
#[derive(Debug, Clone)]
pub struct SheetsRegistryProvider {
    registry: SheetsRegistry,
}

impl SheetsRegistryProvider {
    /// Creates a provider for `registry`.
    pub fn new(registry: SheetsRegistry) -> Self {
        Self { registry }
    }
}

impl ContextProvider for SheetsRegistryProvider {
    fn apply(&self, parent: RegistryContext) -> RegistryContext {
        parent.with_registry(self.registry.clone())
    }
}

/// Scopes a styling engine to a subtree.
#[derive(Debug, Clone)]
pub struct EngineProvider {
    engine: Arc<StyleEngine>,
}

impl EngineProvider {
    /// Creates a provider for `engine`.
    pub fn new(engine: Arc<StyleEngine>) -> Self {
        Self { engine }
    }
}

impl ContextProvider for EngineProvider {
    fn apply(&self, parent: RegistryContext) -> RegistryContext {
        parent.with_engine(Arc::clone(&self.engine))
    }
}

/// Scopes a theme to a subtree.
#[derive(Debug, Clone)]
pub struct ThemeProvider {
    theme: Theme,
}

impl ThemeProvider {
    /// Creates a provider for `theme`.
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl ContextProvider for ThemeProvider {
    fn apply(&self, parent: RegistryContext) -> RegistryContext {
        parent.with_theme(self.theme.clone())
    }
}
