//! A minimal component host.
//!
//! Components are functions of [`Props`] returning a [`Node`] tree. A
//! [`MountPoint`] renders one [`Element`] at a time with replace semantics:
//! rendering an element of the same wrapper type (and key) again updates the
//! mounted instance, anything else unmounts it and mounts the new one.
//!
//! ```rust
//! use stylebind::{inject, MountPoint, Node, Props, RuleSet};
//!
//! let label = inject(RuleSet::new().rule("label", [("font-weight", "bold")]))
//!     .wrap(|props: &Props| Node::text(props.value("text").and_then(|v| v.as_str()).unwrap_or("")));
//!
//! let mut root = MountPoint::new();
//! let output = root.render(label.element(Props::new().with("text", "hi"))).unwrap();
//! assert_eq!(output.to_text(), "hi");
//! root.unmount().unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::RegistryContext;
use crate::error::Result;
use crate::inject::{Injected, Injector, Props};

/// Something that renders props into a node tree.
pub trait Component: Send + Sync {
    /// Renders the component.
    fn render(&self, props: &Props) -> Node;
}

impl<F> Component for F
where
    F: Fn(&Props) -> Node + Send + Sync,
{
    fn render(&self, props: &Props) -> Node {
        (self)(props)
    }
}

/// Rendered output.
#[derive(Clone, Default)]
pub enum Node {
    /// Nothing.
    #[default]
    Empty,
    /// A text leaf.
    Text(String),
    /// A sequence of nodes.
    Fragment(Vec<Node>),
    /// A component still to be rendered with its props.
    Component(Arc<dyn Component>, Props),
}

impl Node {
    /// A text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// A component node.
    pub fn component(component: impl Component + 'static, props: Props) -> Self {
        Node::Component(Arc::new(component), props)
    }

    /// Renders component nodes recursively, leaving only text and fragments.
    pub fn resolve(&self) -> Node {
        match self {
            Node::Empty => Node::Empty,
            Node::Text(text) => Node::Text(text.clone()),
            Node::Fragment(children) => Node::Fragment(children.iter().map(Node::resolve).collect()),
            Node::Component(component, props) => component.render(props).resolve(),
        }
    }

    /// Concatenated text of the resolved tree.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.resolve().collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Fragment(children) => children.iter().for_each(|c| c.collect_text(out)),
            Node::Empty | Node::Component(..) => {}
        }
    }
}

impl From<&str> for Node {
    fn from(text: &str) -> Self {
        Node::text(text)
    }
}

impl From<String> for Node {
    fn from(text: String) -> Self {
        Node::Text(text)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Empty, Node::Empty) => true,
            (Node::Text(a), Node::Text(b)) => a == b,
            (Node::Fragment(a), Node::Fragment(b)) => a == b,
            (Node::Component(a, pa), Node::Component(b, pb)) => Arc::ptr_eq(a, b) && pa == pb,
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty => f.write_str("Empty"),
            Node::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Node::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
            Node::Component(_, props) => f.debug_tuple("Component").field(props).finish(),
        }
    }
}

/// A wrapper type with the props to render it with.
#[derive(Debug, Clone)]
pub struct Element {
    injector: Injector,
    props: Props,
    key: Option<String>,
}

impl Element {
    pub(crate) fn new(injector: Injector, props: Props) -> Self {
        Self {
            injector,
            props,
            key: None,
        }
    }

    /// Sets the key. Elements with different keys never share an instance.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// The wrapper type.
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// The props.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The key, if set.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

struct Slot {
    key: Option<String>,
    instance: Injected,
}

/// A place to render one element into.
///
/// Without a pinned context, each render resolves
/// [`RegistryContext::current`], so providers around the call apply.
#[derive(Default)]
pub struct MountPoint {
    context: Option<RegistryContext>,
    slot: Option<Slot>,
    output: Node,
}

impl MountPoint {
    /// A mount point following the context in scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mount point pinned to `context`.
    pub fn with_context(context: RegistryContext) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    /// Renders `element`, replacing what was rendered before.
    ///
    /// # Errors
    ///
    /// Propagates lifecycle errors. If mounting the new instance fails,
    /// the mount point is left empty.
    pub fn render(&mut self, element: Element) -> Result<Node> {
        let context = self.context();
        let reuse = self.slot.as_ref().is_some_and(|slot| {
            slot.instance.injector().same(&element.injector) && slot.key == element.key
        });

        if reuse {
            if let Some(slot) = &mut self.slot {
                slot.instance.update(element.props, &context)?;
            }
        } else {
            self.unmount()?;
            let mut instance = element.injector.instantiate(element.props);
            instance.mount(&context)?;
            debug!(key = ?element.key, "mounted element");
            self.slot = Some(Slot {
                key: element.key,
                instance,
            });
        }
        self.refresh_output()
    }

    /// Re-renders the mounted instance with its current props.
    ///
    /// Picks up redefined wrapper types and context changes.
    pub fn force_update(&mut self) -> Result<Node> {
        let context = self.context();
        if let Some(slot) = &mut self.slot {
            let props = slot.instance.props().clone();
            slot.instance.update(props, &context)?;
        }
        self.refresh_output()
    }

    /// Unmounts whatever is mounted.
    pub fn unmount(&mut self) -> Result<()> {
        self.output = Node::Empty;
        match self.slot.take() {
            Some(mut slot) => slot.instance.unmount(),
            None => Ok(()),
        }
    }

    /// Returns true if an instance is mounted.
    pub fn is_mounted(&self) -> bool {
        self.slot.is_some()
    }

    /// The mounted instance, if any.
    pub fn instance(&self) -> Option<&Injected> {
        self.slot.as_ref().map(|slot| &slot.instance)
    }

    /// The last rendered output.
    pub fn output(&self) -> &Node {
        &self.output
    }

    fn context(&self) -> RegistryContext {
        self.context.clone().unwrap_or_else(RegistryContext::current)
    }

    fn refresh_output(&mut self) -> Result<Node> {
        self.output = match &self.slot {
            Some(slot) => slot.instance.render()?.resolve(),
            None => Node::Empty,
        };
        Ok(self.output.clone())
    }
}

impl fmt::Debug for MountPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountPoint")
            .field("pinned", &self.context.is_some())
            .field("mounted", &self.is_mounted())
            .field("output", &self.output)
            .finish()
    }
}
