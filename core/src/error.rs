//! Definition-error types.
//!
//! These are raised at discovery time, before any user input is processed:
//! they indicate a programming mistake in the record's own declarations and
//! are never recovered silently.

use thiserror::Error;

/// Fatal problems in an options record's declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// Two non-override declarations share a name or alias under
    /// case-insensitive comparison.
    #[error("option name clash (names are compared case-insensitively): {0}")]
    NameClash(String),

    /// A name or alias collides with the reserved options-file directive key.
    #[error("option name {0} is reserved for options-file expansion")]
    ReservedName(String),

    /// A collection slot has no supplied store and its declared kind cannot
    /// be auto-initialized.
    #[error("collection option {0} cannot be auto-initialized; supply a store instance")]
    CollectionNotInitializable(String),

    /// An override pair mixes a scalar declaration with a collection one.
    #[error("override redeclaration of {0} does not match the original shape")]
    MismatchedOverride(String),

    /// More than one positional declaration on the same record.
    #[error("only one positional-argument declaration is allowed per record")]
    DuplicatePositional,

    /// A compiled-in default does not match the declared value kind.
    #[error("default value for option {0} does not match its declared kind")]
    DefaultKindMismatch(String),
}
