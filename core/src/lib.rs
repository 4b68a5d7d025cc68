//! Core data model and definition discovery for declarative options binding.
//!
//! This crate defines the foundational types for binding a command-line token
//! stream into a declared options record:
//!
//! - [`OptionsRecord`] — the structured object whose named slots are
//!   populated, built from explicit [`OptionDecl`] / [`PositionalDecl`]
//!   registrations.
//! - [`Value`] / [`ValueKind`] — the typed values slots hold and the coercion
//!   from raw tokens.
//! - [`CollectionStore`] — the storage seam behind collection slots, with
//!   [`SequenceStore`] and [`UniqueSetStore`] implementations.
//! - [`DescriptorSet`] — the compiled descriptor set produced by definition
//!   discovery ([`DescriptorSet::compile`]), which detects case-insensitive
//!   name clashes, resolves override pairs, and auto-initializes collection
//!   slots before any parsing occurs.
//! - [`markup`] — the tolerant plain-text renderer for the doc-string markup
//!   subset used in usage output.
//!
//! Definition problems ([`DefinitionError`]) are programmer mistakes in the
//! record's own declarations and fail fatally at discovery time; user-input
//! problems never surface from this crate.
//!
//! # Example
//!
//! ```
//! use optbind_core::*;
//!
//! let mut record = OptionsRecord::new("archive")
//!     .with_one_line_summary("Pack input files into a compressed archive");
//! record.declare(
//!     OptionDecl::scalar("COMPRESSION_LEVEL", ValueKind::Integer)
//!         .with_short_alias("L")
//!         .with_default(Value::Int(6)),
//! );
//! record.declare(OptionDecl::collection(
//!     "TAG",
//!     ValueKind::Text,
//!     CollectionSpec::sequence().with_bounds(1, 3),
//! ));
//!
//! let model = DescriptorSet::compile(&mut record).unwrap();
//! assert!(model.lookup("tag").unwrap().is_collection());
//! assert_eq!(record.int("COMPRESSION_LEVEL"), Some(6));
//! ```

mod error;
pub mod markup;
mod model;
mod record;
mod types;

pub use error::DefinitionError;
pub use model::{Cardinality, Descriptor, DescriptorSet, PositionalDescriptor};
pub use record::{
    CollectionKind, CollectionSpec, OptionDecl, OptionsRecord, PositionalDecl, Slot, SlotId,
};
pub use types::{
    CoercionError, CollectionStore, Provenance, SequenceStore, UniqueSetStore, Value, ValueKind,
};

/// Reserved token key that splices an options file into the argument stream.
pub const OPTIONS_FILE_KEY: &str = "OPTIONS_FILE";
