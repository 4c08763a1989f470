//! The rendering surface sheets attach to.
//!
//! A [`Surface`] stands in for the document a browser would insert `<style>`
//! elements into. Attached sheets are kept in ascending index order, ties in
//! attach order, and [`Surface::to_css`] renders them in that order.
//!
//! Once [`torn down`](Surface::tear_down), the surface accepts nothing and
//! every attach or detach against it becomes a no-op. Hosts may unmount
//! components after their surface is gone.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::util::{insertion_point, lock};

use super::sheet::{SheetId, StyleSheet};

#[derive(Debug, Default)]
struct SurfaceState {
    sheets: Vec<Arc<StyleSheet>>,
    torn_down: bool,
}

/// An ordered set of attached sheets.
#[derive(Debug, Default)]
pub struct Surface {
    state: Mutex<SurfaceState>,
}

impl Surface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a sheet at its index position. Returns false if the surface
    /// is torn down or already holds the sheet.
    pub(crate) fn insert(&self, sheet: Arc<StyleSheet>) -> bool {
        let mut state = lock(&self.state);
        if state.torn_down || state.sheets.iter().any(|s| s.id() == sheet.id()) {
            return false;
        }
        let at = insertion_point(&state.sheets, sheet.index());
        state.sheets.insert(at, sheet);
        true
    }

    /// Removes a sheet. Returns false if it was not present.
    pub(crate) fn remove(&self, id: SheetId) -> bool {
        let mut state = lock(&self.state);
        match state.sheets.iter().position(|s| s.id() == id) {
            Some(at) => {
                state.sheets.remove(at);
                true
            }
            None => false,
        }
    }

    /// Number of attached sheets.
    pub fn len(&self) -> usize {
        lock(&self.state).sheets.len()
    }

    /// Returns true if nothing is attached.
    pub fn is_empty(&self) -> bool {
        lock(&self.state).sheets.is_empty()
    }

    /// Returns true if the given sheet is attached here.
    pub fn contains(&self, sheet: &StyleSheet) -> bool {
        lock(&self.state).sheets.iter().any(|s| s.id() == sheet.id())
    }

    /// Attached sheets in render order.
    pub fn sheets(&self) -> Vec<Arc<StyleSheet>> {
        lock(&self.state).sheets.clone()
    }

    /// Rendered text of every attached sheet, separated by blank lines.
    pub fn to_css(&self) -> String {
        self.sheets()
            .iter()
            .map(|sheet| sheet.to_css())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Drops every attached sheet and refuses further attachments.
    pub fn tear_down(&self) {
        let sheets = {
            let mut state = lock(&self.state);
            state.torn_down = true;
            std::mem::take(&mut state.sheets)
        };
        debug!(sheets = sheets.len(), "tearing down rendering surface");
        for sheet in sheets {
            sheet.mark_detached();
        }
    }

    /// Returns true once [`tear_down`](Self::tear_down) has run.
    pub fn is_torn_down(&self) -> bool {
        lock(&self.state).torn_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SheetOptions, StyleEngine};
    use crate::style::RuleSet;

    fn sheet(engine: &StyleEngine, color: &str, index: i64) -> Arc<StyleSheet> {
        engine
            .create_style_sheet(
                RuleSet::new().rule("a", [("color", color)]),
                SheetOptions::new().index(index),
            )
            .unwrap()
    }

    #[test]
    fn test_surface_orders_by_index() {
        let engine = StyleEngine::new();
        let late = sheet(&engine, "blue", 5);
        let early = sheet(&engine, "red", -3);
        late.attach();
        early.attach();

        let order: Vec<i64> = engine.surface().sheets().iter().map(|s| s.index()).collect();
        assert_eq!(order, vec![-3, 5]);
        let css = engine.surface().to_css();
        assert!(css.find("red").unwrap() < css.find("blue").unwrap());
    }

    #[test]
    fn test_surface_ties_keep_attach_order() {
        let engine = StyleEngine::new();
        let first = sheet(&engine, "red", 0);
        let second = sheet(&engine, "blue", 0);
        second.attach();
        first.attach();

        let ids: Vec<SheetId> = engine.surface().sheets().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![second.id(), first.id()]);
    }

    #[test]
    fn test_tear_down_detaches_everything() {
        let engine = StyleEngine::new();
        let a = sheet(&engine, "red", 0);
        a.attach();

        engine.surface().tear_down();
        assert!(engine.surface().is_torn_down());
        assert!(engine.surface().is_empty());
        assert!(!a.is_attached());

        // Detach and re-attach against a torn down surface are no-ops.
        assert!(!a.detach());
        assert!(!a.attach());
        assert!(!engine.surface().contains(&a));
    }
}
