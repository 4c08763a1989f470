//! The per-instance sheet lifecycle.

use std::sync::Arc;

use tracing::{debug, error};

use crate::context::RegistryContext;
use crate::engine::{Classes, StyleEngine, StyleSheet};
use crate::error::{Result, SheetError, StyleError};
use crate::host::Node;
use crate::registry::SheetsRegistry;
use crate::style::{StyleDefinition, StyleInput};
use crate::theme::Theme;

use super::props::{Props, CLASSES, SHEET, THEME};
use super::{Injector, Styles};

/// One reference to a shared sheet.
struct Held {
    definition: StyleDefinition,
    sheet: Arc<StyleSheet>,
}

struct Mounted {
    engine: Arc<StyleEngine>,
    registry: SheetsRegistry,
    theme: Option<Theme>,
    held: Option<Held>,
}

enum Phase {
    Created,
    Mounted(Mounted),
    Unmounted,
}

/// A mounted (or mountable) instance of a wrapper type.
///
/// Instances are single-use: created, mounted once, updated any number of
/// times, unmounted once. Unmounting twice is a no-op, and dropping a
/// mounted instance unmounts it, so its reference is released exactly once.
pub struct Injected {
    injector: Injector,
    props: Props,
    phase: Phase,
}

impl Injected {
    pub(crate) fn new(injector: Injector, props: Props) -> Self {
        Self {
            injector,
            props,
            phase: Phase::Created,
        }
    }

    /// Acquires the sheet and registers it with the context's registry.
    ///
    /// The wrapper's own engine, if it has one, wins over the context's.
    ///
    /// # Errors
    ///
    /// [`SheetError::AlreadyMounted`] on a second mount, and
    /// [`StyleError::ThemeRequired`] when a themed definition mounts with no
    /// theme in scope. Compilation errors are propagated as they are. On
    /// error the instance stays unmounted and holds nothing.
    pub fn mount(&mut self, context: &RegistryContext) -> Result<()> {
        if !matches!(self.phase, Phase::Created) {
            return Err(SheetError::AlreadyMounted);
        }
        let engine = self
            .injector
            .engine()
            .cloned()
            .unwrap_or_else(|| Arc::clone(context.engine()));
        let registry = context.registry().clone();
        let theme = self.resolve_theme(context);
        let input = self.style_input(theme.clone());

        let held = acquire(&engine, &registry, &self.injector.styles(), &input)?;
        debug!(
            engine = %engine.id(),
            sheet = ?held.as_ref().map(|h| h.sheet.id()),
            "mounted instance"
        );
        self.phase = Phase::Mounted(Mounted {
            engine,
            registry,
            theme,
            held,
        });
        Ok(())
    }

    /// Renders the wrapped component, or the children for a container.
    ///
    /// The component gets `classes`, `sheet` and `theme` on top of the
    /// instance props. Props the caller already set under those names are
    /// passed through unchanged.
    ///
    /// # Errors
    ///
    /// [`SheetError::NotMounted`] outside the mounted phase.
    pub fn render(&self) -> Result<Node> {
        let Phase::Mounted(mounted) = &self.phase else {
            return Err(SheetError::NotMounted);
        };
        let mut props = self.props.clone();
        if !props.contains(CLASSES) {
            let classes = mounted
                .held
                .as_ref()
                .map(|held| held.sheet.classes())
                .unwrap_or_default();
            props.set(CLASSES, classes);
        }
        if !props.contains(SHEET) {
            if let Some(held) = &mounted.held {
                props.set(SHEET, Arc::clone(&held.sheet));
            }
        }
        if !props.contains(THEME) {
            if let Some(theme) = &mounted.theme {
                props.set(THEME, theme.clone());
            }
        }

        Ok(match self.injector.target() {
            Some(target) => target.render(&props),
            None => Node::Fragment(props.children().to_vec()),
        })
    }

    /// Applies new props and the theme of `context`.
    ///
    /// The registry and engine stay the ones resolved at mount; only the
    /// theme is taken from `context`.
    ///
    /// If the wrapper's definition was replaced since the last mount or
    /// update, the sheet for the new definition is acquired and the old one
    /// released. Otherwise a dynamic sheet last computed from a different
    /// input, by this instance or another, is updated in place; it stays
    /// attached and registered.
    ///
    /// # Errors
    ///
    /// [`SheetError::NotMounted`] outside the mounted phase. Errors from
    /// acquiring or updating leave the previous sheet in place.
    pub fn update(&mut self, props: Props, context: &RegistryContext) -> Result<()> {
        if !matches!(self.phase, Phase::Mounted(_)) {
            return Err(SheetError::NotMounted);
        }
        self.props = props;
        let theme = self.resolve_theme(context);
        let input = self.style_input(theme.clone());
        let styles = self.injector.styles();

        let Phase::Mounted(mounted) = &mut self.phase else {
            return Err(SheetError::NotMounted);
        };
        let current = mounted.held.as_ref().map(|held| held.definition.key());
        let next = styles.definition.as_ref().map(StyleDefinition::key);

        if current != next {
            let held = acquire(&mounted.engine, &mounted.registry, &styles, &input)?;
            let old = std::mem::replace(&mut mounted.held, held);
            mounted.theme = theme;
            debug!(from = ?current, to = ?next, "instance switched definition");
            if let Some(old) = old {
                mounted.engine.release(&old.definition)?;
            }
            return Ok(());
        }
        if let Some(held) = &mounted.held {
            if held.definition.is_dynamic() {
                held.sheet.update(&input)?;
            }
        }
        mounted.theme = theme;
        Ok(())
    }

    /// Releases the sheet.
    ///
    /// Calling this again, or on an instance that never mounted, does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Propagates invariant violations from the sheet cache. The instance
    /// counts as unmounted either way.
    pub fn unmount(&mut self) -> Result<()> {
        let Phase::Mounted(mounted) = std::mem::replace(&mut self.phase, Phase::Unmounted) else {
            return Ok(());
        };
        if let Some(held) = mounted.held {
            mounted.engine.release(&held.definition)?;
        }
        debug!("unmounted instance");
        Ok(())
    }

    /// Returns true between mount and unmount.
    pub fn is_mounted(&self) -> bool {
        matches!(self.phase, Phase::Mounted(_))
    }

    /// The wrapper type this is an instance of.
    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    /// The props last passed to the instance.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The sheet held while mounted.
    pub fn sheet(&self) -> Option<Arc<StyleSheet>> {
        match &self.phase {
            Phase::Mounted(mounted) => mounted.held.as_ref().map(|held| Arc::clone(&held.sheet)),
            _ => None,
        }
    }

    /// The computed class mapping while mounted.
    pub fn classes(&self) -> Option<Classes> {
        self.sheet().map(|sheet| sheet.classes())
    }

    fn resolve_theme(&self, context: &RegistryContext) -> Option<Theme> {
        self.props
            .theme()
            .or_else(|| context.theme())
            .cloned()
    }

    fn style_input(&self, theme: Option<Theme>) -> StyleInput {
        StyleInput {
            theme,
            props: self
                .props
                .values_for(self.injector.options().dynamic_props.as_deref()),
        }
    }
}

impl Drop for Injected {
    fn drop(&mut self) {
        if let Err(err) = self.unmount() {
            error!(%err, "failed to release sheet while dropping instance");
        }
    }
}

fn acquire(
    engine: &StyleEngine,
    registry: &SheetsRegistry,
    styles: &Styles,
    input: &StyleInput,
) -> Result<Option<Held>> {
    let Some(definition) = styles.definition.clone() else {
        return Ok(None);
    };
    if definition.requires_theme() && input.theme.is_none() {
        return Err(StyleError::ThemeRequired.into());
    }
    let sheet = engine.acquire(&definition, &styles.sheet_options, input)?;
    if let Err(err) = sync_and_register(engine, registry, &definition, &sheet, input) {
        engine.release(&definition)?;
        return Err(err);
    }
    Ok(Some(Held { definition, sheet }))
}

// A cached dynamic sheet may have been computed from another instance's input.
fn sync_and_register(
    engine: &StyleEngine,
    registry: &SheetsRegistry,
    definition: &StyleDefinition,
    sheet: &StyleSheet,
    input: &StyleInput,
) -> Result<()> {
    if definition.is_dynamic() {
        sheet.update(input)?;
    }
    engine.register(definition, registry)?;
    Ok(())
}
