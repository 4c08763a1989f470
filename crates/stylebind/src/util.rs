//! Small helpers shared across the crate.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::engine::StyleSheet;

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// Every structure guarded this way is left consistent between statements,
/// so the poisoned value is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the position at which a sheet with `index` must be inserted to
/// keep `sheets` in ascending index order.
///
/// Equal indices go after the existing ones, so ties keep insertion order.
pub(crate) fn insertion_point(sheets: &[Arc<StyleSheet>], index: i64) -> usize {
    sheets.partition_point(|sheet| sheet.index() <= index)
}

/// Checks that `name` is usable as a rule name: `[A-Za-z_][A-Za-z0-9_-]*`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
