//! Token-stream assembly.
//!
//! Turns raw argv into a flat, provenance-tagged token sequence, expanding
//! `OPTIONS_FILE=<path>` directives in place. `KEY=VALUE` elements split on
//! the first `=`; an empty `VALUE` consumes the following element as its
//! value, so `KEY= VALUE` works, and a trailing `KEY=` binds the empty
//! string. Elements without `=` become positional candidates.

use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use optbind_core::{OPTIONS_FILE_KEY, Provenance};

/// Expansion stops here; an options file referencing itself would otherwise
/// recurse forever.
const MAX_INCLUDE_DEPTH: usize = 16;

/// Reads the referenced text resource during options-file expansion.
///
/// The engine only ever needs the file's lines; embedding applications may
/// substitute any line source (tests use an in-memory map).
pub trait OptionsFileReader {
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// Default reader over the local filesystem.
#[derive(Debug, Default)]
pub struct FsOptionsFileReader;

impl OptionsFileReader for FsOptionsFileReader {
    fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        Ok(std::fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// One assembled token, consumed in strict order by the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// `None` marks a positional candidate.
    pub key: Option<String>,
    pub value: String,
    pub provenance: Provenance,
}

/// The flat token sequence plus non-fatal assembly diagnostics.
#[derive(Debug, Default)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub warnings: Vec<String>,
}

/// Fatal assembly problems. Options-file reads happen inline and are not
/// retried; a failed read fails the whole parse.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("cannot read options file {path}: {source}")]
    OptionsFileUnreadable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("options files nested deeper than {0} levels")]
    IncludeDepthExceeded(usize),
}

/// Assembles raw argv into the flat token sequence.
pub fn assemble<S: AsRef<str>>(
    args: &[S],
    reader: &dyn OptionsFileReader,
) -> Result<TokenStream, AssemblyError> {
    let mut stream = TokenStream::default();
    let mut i = 0;
    while i < args.len() {
        let raw = args[i].as_ref();
        match raw.find('=') {
            Some(eq) => {
                let key = &raw[..eq];
                let mut value = raw[eq + 1..].to_string();
                if value.is_empty() && i + 1 < args.len() {
                    i += 1;
                    value = args[i].as_ref().to_string();
                }
                push_pair(key, &value, Provenance::Direct, reader, &mut stream, 0)?;
            }
            None => stream.tokens.push(Token {
                key: None,
                value: raw.to_string(),
                provenance: Provenance::Direct,
            }),
        }
        i += 1;
    }
    Ok(stream)
}

fn push_pair(
    key: &str,
    value: &str,
    provenance: Provenance,
    reader: &dyn OptionsFileReader,
    stream: &mut TokenStream,
    depth: usize,
) -> Result<(), AssemblyError> {
    if key.eq_ignore_ascii_case(OPTIONS_FILE_KEY) {
        return expand_file(value, reader, stream, depth);
    }
    stream.tokens.push(Token {
        key: Some(key.to_string()),
        value: value.to_string(),
        provenance,
    });
    Ok(())
}

fn expand_file(
    path: &str,
    reader: &dyn OptionsFileReader,
    stream: &mut TokenStream,
    depth: usize,
) -> Result<(), AssemblyError> {
    if depth >= MAX_INCLUDE_DEPTH {
        return Err(AssemblyError::IncludeDepthExceeded(MAX_INCLUDE_DEPTH));
    }
    let lines = reader
        .read_lines(Path::new(path))
        .map_err(|source| AssemblyError::OptionsFileUnreadable {
            path: path.to_string(),
            source,
        })?;
    debug!(path, lines = lines.len(), "expanding options file");

    for line in &lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.find('=') {
            Some(eq) => push_pair(
                &line[..eq],
                &line[eq + 1..],
                Provenance::OptionsFile,
                reader,
                stream,
                depth + 1,
            )?,
            None => stream
                .warnings
                .push(format!("ignoring options-file line without '=': {line}")),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Debug, Default)]
    struct MapReader {
        files: HashMap<String, Vec<String>>,
    }

    impl MapReader {
        fn with(mut self, path: &str, lines: &[&str]) -> Self {
            self.files
                .insert(path.to_string(), lines.iter().map(|l| l.to_string()).collect());
            self
        }
    }

    impl OptionsFileReader for MapReader {
        fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
            self.files
                .get(path.to_str().unwrap())
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    fn keys_and_values(stream: &TokenStream) -> Vec<(Option<&str>, &str)> {
        stream
            .tokens
            .iter()
            .map(|t| (t.key.as_deref(), t.value.as_str()))
            .collect()
    }

    #[test]
    fn test_split_on_first_equals() {
        let stream = assemble(&["A=x=y", "positional"], &MapReader::default()).unwrap();
        assert_eq!(
            keys_and_values(&stream),
            vec![(Some("A"), "x=y"), (None, "positional")]
        );
    }

    #[test]
    fn test_empty_value_consumes_following_element() {
        let stream = assemble(&["A=", "17", "B=2"], &MapReader::default()).unwrap();
        assert_eq!(
            keys_and_values(&stream),
            vec![(Some("A"), "17"), (Some("B"), "2")]
        );
    }

    #[test]
    fn test_terminal_equals_binds_empty_string() {
        let stream = assemble(&["A=1", "B="], &MapReader::default()).unwrap();
        assert_eq!(keys_and_values(&stream), vec![(Some("A"), "1"), (Some("B"), "")]);
    }

    #[test]
    fn test_options_file_splices_in_place_with_provenance() {
        let reader = MapReader::default().with("opts", &["T=18", "", "LIST=a"]);
        let stream = assemble(&["A=1", "OPTIONS_FILE=opts", "B=2"], &reader).unwrap();
        assert_eq!(
            keys_and_values(&stream),
            vec![
                (Some("A"), "1"),
                (Some("T"), "18"),
                (Some("LIST"), "a"),
                (Some("B"), "2"),
            ]
        );
        assert_eq!(stream.tokens[0].provenance, Provenance::Direct);
        assert_eq!(stream.tokens[1].provenance, Provenance::OptionsFile);
        assert_eq!(stream.tokens[2].provenance, Provenance::OptionsFile);
        assert_eq!(stream.tokens[3].provenance, Provenance::Direct);
    }

    #[test]
    fn test_options_file_may_be_expanded_more_than_once() {
        let reader = MapReader::default().with("opts", &["T=18"]);
        let stream =
            assemble(&["OPTIONS_FILE=opts", "OPTIONS_FILE=opts"], &reader).unwrap();
        assert_eq!(
            keys_and_values(&stream),
            vec![(Some("T"), "18"), (Some("T"), "18")]
        );
    }

    #[test]
    fn test_nested_options_files_expand_recursively() {
        let reader = MapReader::default()
            .with("outer", &["A=1", "OPTIONS_FILE=inner"])
            .with("inner", &["B=2"]);
        let stream = assemble(&["OPTIONS_FILE=outer"], &reader).unwrap();
        assert_eq!(
            keys_and_values(&stream),
            vec![(Some("A"), "1"), (Some("B"), "2")]
        );
    }

    #[test]
    fn test_self_referencing_options_file_is_cut_off() {
        let reader = MapReader::default().with("loop", &["OPTIONS_FILE=loop"]);
        assert!(matches!(
            assemble(&["OPTIONS_FILE=loop"], &reader),
            Err(AssemblyError::IncludeDepthExceeded(_))
        ));
    }

    #[test]
    fn test_unreadable_options_file_is_fatal() {
        let err = assemble(&["OPTIONS_FILE=missing"], &MapReader::default()).unwrap_err();
        assert!(matches!(err, AssemblyError::OptionsFileUnreadable { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_options_file_line_without_equals_is_skipped_with_warning() {
        let reader = MapReader::default().with("opts", &["not-a-pair", "T=18"]);
        let stream = assemble(&["OPTIONS_FILE=opts"], &reader).unwrap();
        assert_eq!(keys_and_values(&stream), vec![(Some("T"), "18")]);
        assert_eq!(stream.warnings.len(), 1);
        assert!(stream.warnings[0].contains("not-a-pair"));
    }
}
