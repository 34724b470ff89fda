use std::{fmt, path::PathBuf};

use crate::event_log::import_xes::XESParseError;

/// Level of the XES hierarchy an attribute was looked up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Log-level attribute
    Log,
    /// Trace-level attribute
    Trace,
    /// Event-level attribute
    Event,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementKind::Log => "log",
            ElementKind::Trace => "trace",
            ElementKind::Event => "event",
        })
    }
}

/// The given path cannot be used as an XES log file
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Path does not exist or is not a regular file
    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),
    /// File name does not end in `.xes` or `.xes.gz`
    #[error("wrong extension (expected .xes or .xes.gz): {}", .0.display())]
    WrongExtension(PathBuf),
    /// File could not be opened or read while probing its content
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
}

/// Content of a log (or a single log element) is not in the expected format
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Neither the plain nor the gzip XES parser accepts the file content
    #[error("file format can't be parsed: {}", .0.display())]
    UnrecognizedContent(PathBuf),
    /// XES parsing failed
    #[error(transparent)]
    Parse(#[from] XESParseError),
    /// A required attribute is not present
    #[error("cannot find '{key}' entry for {element}")]
    MissingAttribute {
        /// Attribute key
        key: &'static str,
        /// Element the attribute was looked up on
        element: ElementKind,
    },
    /// A required attribute is present, but has the wrong type or cannot be parsed
    #[error("invalid '{key}' entry for {element}: {value:?}")]
    InvalidAttribute {
        /// Attribute key
        key: &'static str,
        /// Element the attribute was looked up on
        element: ElementKind,
        /// Textual form of the offending value
        value: String,
    },
    /// The operation needs the first event of a trace, but the trace is empty
    #[error("trace has no events")]
    EmptyTrace,
}

/// Writing a log failed
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// Parent directories of the target could not be created
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// Target file could not be created or flushed
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// XML writer failed
    #[error("failed to write XES: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl From<std::io::Error> for SerializationError {
    fn from(e: std::io::Error) -> Self {
        SerializationError::Xml(quick_xml::Error::from(e))
    }
}

///
/// Error returned by the file-level operations (see [`crate::io`])
///
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// See [`PathError`]
    #[error(transparent)]
    Path(#[from] PathError),
    /// See [`FormatError`]
    #[error(transparent)]
    Format(#[from] FormatError),
    /// See [`SerializationError`]
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

impl From<XESParseError> for Error {
    fn from(e: XESParseError) -> Self {
        Error::Format(FormatError::Parse(e))
    }
}
