//! Binding pipeline for declarative options records.
//!
//! This crate drives the record model from `optbind-core` through the full
//! pipeline: token-stream assembly (with in-place `OPTIONS_FILE=<path>`
//! expansion), value binding under accumulate/replace/clear rules, constraint
//! validation (required fields, cardinality bounds, mutex cliques), usage
//! rendering, and command-line reconstruction.
//!
//! The central type is [`CommandLineParser`]. Construction compiles the
//! record's declarations and fails fatally on definition errors; parsing
//! afterwards never panics on user input, returning a boolean status with
//! diagnostics written to a caller-supplied sink.
//!
//! # Example
//!
//! ```
//! use optbind_core::{
//!     CollectionSpec, OptionDecl, OptionsRecord, PositionalDecl, Value, ValueKind,
//! };
//! use optbind_parser::CommandLineParser;
//!
//! let mut record = OptionsRecord::new("archive")
//!     .with_one_line_summary("Pack input files into a compressed archive");
//! record.declare(
//!     OptionDecl::scalar("COMPRESSION_LEVEL", ValueKind::Integer)
//!         .with_short_alias("L")
//!         .with_default(Value::Int(6))
//!         .with_doc("Compression level setting."),
//! );
//! record.declare(OptionDecl::scalar(
//!     "MODE",
//!     ValueKind::choice(&["FAST", "SMALL", "KEEP"]),
//! ));
//! record.declare(OptionDecl::collection(
//!     "TAG",
//!     ValueKind::Text,
//!     CollectionSpec::sequence().with_bounds(1, 3),
//! ));
//! record.declare_positional(
//!     PositionalDecl::new("input-file output-file", ValueKind::Path).with_bounds(2, 2),
//! );
//!
//! let mut parser = CommandLineParser::new(record).unwrap();
//! let mut sink = Vec::new();
//! let ok = parser.parse_arguments(
//!     &mut sink,
//!     &["L=9", "MODE=SMALL", "TAG=nightly", "in.dat", "out.dat"],
//! );
//! assert!(ok, "{}", String::from_utf8_lossy(&sink));
//! assert_eq!(parser.record().int("COMPRESSION_LEVEL"), Some(9));
//! assert_eq!(parser.record().symbol("MODE"), Some("SMALL"));
//! assert_eq!(parser.record().positional_values().len(), 2);
//! ```

mod bind;
mod cmdline;
mod constraints;
mod report;
mod tokens;
mod usage;

pub use bind::{BindError, CLEAR_SENTINEL, CommandLineParser};
pub use constraints::ConstraintViolation;
pub use report::{ArgumentReport, BindingReport};
pub use tokens::{AssemblyError, FsOptionsFileReader, OptionsFileReader, Token, TokenStream};
