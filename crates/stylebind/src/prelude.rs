//! Common imports in one line.
//!
//! ```rust
//! use stylebind::prelude::*;
//!
//! let wrapper = inject(RuleSet::new().rule("root", [("margin", "0")])).container();
//! let mut root = MountPoint::new();
//! root.render(wrapper.element(Props::new())).unwrap();
//! root.unmount().unwrap();
//! ```

pub use crate::context::{ContextProvider, SheetsRegistryProvider, ThemeProvider};
pub use crate::host::{Component, MountPoint, Node};
pub use crate::inject::{inject, inject_with, InjectOptions, Injector, Props};
pub use crate::registry::SheetsRegistry;
pub use crate::style::{RuleSet, StyleDefinition};
pub use crate::theme::Theme;
pub use crate::RegistryContext;
