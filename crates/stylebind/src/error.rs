//! Error types for sheet lifecycle management.
//!
//! Two families of failures exist:
//!
//! - [`StyleError`]: the caller handed over something that cannot be compiled
//!   (bad rule names, a themed definition without a theme, unparsable YAML).
//!   These are returned unchanged to the caller.
//! - The invariant variants of [`SheetError`]: the lifecycle bookkeeping went
//!   wrong (a release without a matching acquire, removing a sheet that is not
//!   registered). These indicate a bug and are never corrected silently.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::SheetId;
use crate::style::DefinitionKey;

/// Errors raised while building a style definition or compiling it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// A rule has an unusable name or declaration.
    #[error("invalid rule '{rule}': {message}")]
    InvalidRule {
        /// Name of the offending rule.
        rule: String,
        /// What was wrong with it.
        message: String,
    },

    /// A themed definition was evaluated without a theme in scope.
    #[error("style definition requires a theme, but none is provided")]
    ThemeRequired,

    /// YAML content could not be parsed.
    #[error("failed to parse style definition: {0}")]
    Parse(String),

    /// A file could not be read.
    #[error("failed to read {}: {message}", path.display())]
    Load {
        /// Path that failed to load.
        path: PathBuf,
        /// Error message from the filesystem.
        message: String,
    },
}

impl From<serde_yaml::Error> for StyleError {
    fn from(err: serde_yaml::Error) -> Self {
        StyleError::Parse(err.to_string())
    }
}

/// Errors raised by the sheet cache, the registry and injected instances.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// Compiling or updating a sheet failed.
    #[error(transparent)]
    Style(#[from] StyleError),

    /// A definition was released more often than it was acquired.
    #[error("reference count underflow for {key}")]
    RefCountUnderflow {
        /// Cache key of the definition.
        key: DefinitionKey,
    },

    /// A registry operation referred to a definition that holds no sheet.
    #[error("no sheet is acquired for {key}")]
    NotAcquired {
        /// Cache key of the definition.
        key: DefinitionKey,
    },

    /// A sheet was removed from a registry that does not contain it.
    #[error("{sheet} is not registered")]
    NotRegistered {
        /// The missing sheet.
        sheet: SheetId,
    },

    /// `mount` was called on an instance that is, or has been, mounted.
    #[error("instance has already been mounted")]
    AlreadyMounted,

    /// An operation that needs a mounted instance was called before mount
    /// or after unmount.
    #[error("instance is not mounted")]
    NotMounted,
}

impl SheetError {
    /// Returns `true` for errors caused by broken lifecycle bookkeeping
    /// rather than by user input.
    pub fn is_invariant_violation(&self) -> bool {
        !matches!(self, SheetError::Style(_))
    }
}

/// Result type for sheet lifecycle operations.
pub type Result<T> = std::result::Result<T, SheetError>;
