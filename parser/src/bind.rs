//! Value binding: consuming the token stream against the compiled
//! descriptor set.
//!
//! Binding never returns `Err` for user-input problems. The caller observes
//! failure through [`CommandLineParser::parse_arguments`]'s boolean status
//! plus diagnostic lines written to the supplied sink.

use std::io::Write;

use thiserror::Error;
use tracing::{debug, warn};

use optbind_core::{CoercionError, DefinitionError, DescriptorSet, OptionsRecord, Provenance};

use crate::tokens::{self, AssemblyError, FsOptionsFileReader, OptionsFileReader, Token};
use crate::{cmdline, constraints, report, usage};

/// Reserved literal that clears a slot instead of being coerced as data.
pub const CLEAR_SENTINEL: &str = "null";

/// One token's binding failure. Formatted onto the diagnostic sink; the
/// parse stops at the first of these.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("unrecognized option: {0}")]
    UnrecognizedOption(String),

    #[error("invalid value for option {option}: {source}")]
    Coercion {
        option: String,
        #[source]
        source: CoercionError,
    },

    #[error("option {0} was supplied on the command line and cannot be overridden from an options file")]
    DisallowedFileOverride(String),

    #[error("the literal '{CLEAR_SENTINEL}' is not a legal positional value")]
    NullPositional,

    #[error("invalid positional value '{value}': {source}")]
    PositionalCoercion {
        value: String,
        #[source]
        source: CoercionError,
    },

    #[error("invalid positional value '{0}': this record declares no positional arguments")]
    UnexpectedPositional(String),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// Binds argument token streams into one options record.
///
/// Construction runs definition discovery and fails fatally on definition
/// errors; parsing afterwards is infallible in the `Result` sense and reports
/// user-input problems through its boolean status and the diagnostic sink.
///
/// # Examples
///
/// ```
/// use optbind_core::{OptionDecl, OptionsRecord, Value, ValueKind};
/// use optbind_parser::CommandLineParser;
///
/// let mut record = OptionsRecord::new("archive");
/// record.declare(
///     OptionDecl::scalar("COMPRESSION_LEVEL", ValueKind::Integer)
///         .with_short_alias("L")
///         .with_default(Value::Int(6)),
/// );
///
/// let mut parser = CommandLineParser::new(record).unwrap();
/// let mut sink: Vec<u8> = Vec::new();
/// assert!(parser.parse_arguments(&mut sink, &["L=9"]));
/// assert_eq!(parser.record().int("COMPRESSION_LEVEL"), Some(9));
/// ```
pub struct CommandLineParser {
    record: OptionsRecord,
    model: DescriptorSet,
    reader: Box<dyn OptionsFileReader>,
}

impl CommandLineParser {
    /// Runs definition discovery over the record and initializes its slots.
    pub fn new(mut record: OptionsRecord) -> Result<Self, DefinitionError> {
        let model = DescriptorSet::compile(&mut record)?;
        Ok(Self {
            record,
            model,
            reader: Box::new(FsOptionsFileReader),
        })
    }

    /// Substitutes the options-file reader collaborator.
    pub fn with_options_file_reader(mut self, reader: Box<dyn OptionsFileReader>) -> Self {
        self.reader = reader;
        self
    }

    pub fn record(&self) -> &OptionsRecord {
        &self.record
    }

    /// Hands the bound record back to the caller.
    pub fn into_record(self) -> OptionsRecord {
        self.record
    }

    /// Assembles, binds, and validates one argument sequence.
    ///
    /// Returns `true` on success. On failure every detected constraint
    /// violation (not just the first) has been written to `sink` as an
    /// `ERROR:` line; binding problems stop at the first offending token.
    /// Sink write failures are ignored; diagnostics are best-effort.
    pub fn parse_arguments<S: AsRef<str>>(&mut self, sink: &mut dyn Write, args: &[S]) -> bool {
        let stream = match tokens::assemble(args, self.reader.as_ref()) {
            Ok(stream) => stream,
            Err(err) => {
                emit(sink, "ERROR", &err.to_string());
                return false;
            }
        };
        for warning in &stream.warnings {
            emit(sink, "WARNING", warning);
        }

        for token in &stream.tokens {
            if let Err(err) = self.bind_token(sink, token) {
                emit(sink, "ERROR", &err.to_string());
                return false;
            }
        }

        let violations = constraints::validate(&self.model, &self.record);
        for violation in &violations {
            emit(sink, "ERROR", &violation.to_string());
        }
        violations.is_empty()
    }

    fn bind_token(&mut self, sink: &mut dyn Write, token: &Token) -> Result<(), BindError> {
        match &token.key {
            None => self.bind_positional(token),
            Some(key) => self.bind_named(sink, key, token),
        }
    }

    fn bind_positional(&mut self, token: &Token) -> Result<(), BindError> {
        if token.value == CLEAR_SENTINEL {
            return Err(BindError::NullPositional);
        }
        let Some(positional) = self.model.positional() else {
            return Err(BindError::UnexpectedPositional(token.value.clone()));
        };
        let value = positional
            .kind
            .coerce(&token.value)
            .map_err(|source| BindError::PositionalCoercion {
                value: token.value.clone(),
                source,
            })?;
        self.record
            .append_value(positional.target, value, token.provenance);
        Ok(())
    }

    fn bind_named(
        &mut self,
        sink: &mut dyn Write,
        key: &str,
        token: &Token,
    ) -> Result<(), BindError> {
        let Some(descriptor) = self.model.lookup(key) else {
            if token.provenance == Provenance::OptionsFile {
                // Options files are shared across tools; keys a given record
                // does not declare are skipped, not fatal.
                warn!(key, "skipping unrecognized options-file key");
                emit(
                    sink,
                    "WARNING",
                    &format!("ignoring unrecognized option from options file: {key}"),
                );
                return Ok(());
            }
            return Err(BindError::UnrecognizedOption(key.to_string()));
        };

        let primary = descriptor.primary_target();
        if token.provenance == Provenance::OptionsFile
            && self.record.slot(primary).source() == Some(Provenance::Direct)
        {
            return Err(BindError::DisallowedFileOverride(descriptor.name.clone()));
        }

        if token.value == CLEAR_SENTINEL {
            debug!(option = %descriptor.name, "clearing slot");
            for target in descriptor.targets.iter().copied() {
                if descriptor.is_collection() {
                    self.record.clear_values(target, token.provenance);
                } else {
                    self.record.write_scalar(target, None, token.provenance);
                }
            }
            return Ok(());
        }

        let value = descriptor
            .kind
            .coerce(&token.value)
            .map_err(|source| BindError::Coercion {
                option: descriptor.name.clone(),
                source,
            })?;
        debug!(option = %descriptor.name, provenance = ?token.provenance, "binding value");
        for target in descriptor.targets.iter().copied() {
            if descriptor.is_collection() {
                self.record
                    .append_value(target, value.clone(), token.provenance);
            } else {
                self.record
                    .write_scalar(target, Some(value.clone()), token.provenance);
            }
        }
        Ok(())
    }

    /// Renders usage documentation. Succeeds whether or not the record has
    /// ever been parsed; `detailed` adds the full summary text.
    ///
    /// # Panics
    ///
    /// Panics when a doc string renders to non-ASCII text or contains an
    /// unresolvable character reference (an authoring mistake in the record).
    pub fn usage(&self, out: &mut dyn Write, detailed: bool) -> std::io::Result<()> {
        usage::render(&self.record, &self.model, out, detailed)
    }

    /// Reconstructs a redisplayable command line from the bound record.
    pub fn command_line(&self) -> String {
        cmdline::reconstruct(&self.record, &self.model)
    }

    /// Structured, serializable view of the bound record.
    pub fn binding_report(&self) -> report::BindingReport {
        report::build(&self.record, &self.model)
    }
}

fn emit(sink: &mut dyn Write, severity: &str, message: &str) {
    let _ = writeln!(sink, "{severity}: {message}");
}
