//! File-level IO for XES event logs: encoding probing, loading (with optional sorting) and saving

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::GzDecoder, write::GzEncoder, Compression};
use quick_xml::{events::Event as XmlEvent, Reader};
use serde::{Deserialize, Serialize};

use crate::{
    diagnostics::{DiagnosticSink, TracingSink},
    error::{Error, FormatError, PathError, SerializationError},
    event_log::{
        constants::{GZIP_MAGIC, XES_EXTENSION, XES_GZ_EXTENSION},
        export_xes::export_xes_event_log,
        import_xes::{import_xes_with_sink, XESImportOptions},
        EventLog,
    },
    normalize::{sort_log, sort_log_with_priority},
};

/// Encoding variant of a XES file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XesEncoding {
    /// Plain XML
    Plain,
    /// Gzip-compressed XML
    Gzip,
}

impl std::fmt::Display for XesEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            XesEncoding::Plain => "xes",
            XesEncoding::Gzip => "xes.gz",
        })
    }
}

///
/// Options for [`load_xes`]
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoadOptions {
    /// Sort the log by timestamp after parsing (see [`crate::normalize::sort_log`])
    pub sort_by_timestamp: bool,
    /// Event classes used to break timestamp ties when sorting
    pub priority_classes: Option<Vec<String>>,
    /// Options passed on to the XES parser
    pub import: XESImportOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sort_by_timestamp: true,
            priority_classes: None,
            import: XESImportOptions::default(),
        }
    }
}

fn has_xes_extension(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .is_some_and(|name| name.ends_with(XES_EXTENSION) || name.ends_with(XES_GZ_EXTENSION))
}

fn open(path: &Path) -> Result<BufReader<File>, PathError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| PathError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn starts_with_gzip_magic(reader: &mut impl BufRead) -> std::io::Result<bool> {
    Ok(reader.fill_buf()?.starts_with(&GZIP_MAGIC))
}

/// Whether the first XML element of `reader` is `<log>`
fn first_element_is_log(reader: impl BufRead) -> bool {
    let mut reader = Reader::from_reader(reader);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(e)) | Ok(XmlEvent::Empty(e)) => {
                return e.local_name().as_ref() == b"log";
            }
            Ok(XmlEvent::Eof) | Err(_) => return false,
            Ok(_) => {}
        }
        buf.clear();
    }
}

///
/// Detect the encoding variant of the XES file at `path`
///
/// Returns `None` if neither the plain nor the gzip parser accepts the file: gzip is recognized by its magic
/// bytes, and the (decompressed) XML must start with a `<log>` element.
///
pub fn detect_encoding(path: impl AsRef<Path>) -> Result<Option<XesEncoding>, PathError> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let is_gz = starts_with_gzip_magic(&mut reader).map_err(|source| PathError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let encoding = if is_gz {
        first_element_is_log(BufReader::new(GzDecoder::new(reader))).then_some(XesEncoding::Gzip)
    } else {
        first_element_is_log(reader).then_some(XesEncoding::Plain)
    };
    tracing::debug!(path = %path.display(), ?encoding, "probed XES encoding");
    Ok(encoding)
}

/// Whether any of the XES parsers accepts the file at `path` (see [`detect_encoding`])
pub fn can_parse(path: impl AsRef<Path>) -> Result<bool, PathError> {
    Ok(detect_encoding(path)?.is_some())
}

///
/// Load an [`EventLog`] from a `.xes` or `.xes.gz` file
///
/// Recoverable parser problems are logged via [`tracing`]; see [`load_xes_with_sink`] to collect them instead.
///
pub fn load_xes(path: impl AsRef<Path>, options: LoadOptions) -> Result<EventLog, Error> {
    load_xes_with_sink(path, options, TracingSink)
}

///
/// Load an [`EventLog`] from a `.xes` or `.xes.gz` file, reporting recoverable parser problems to `sink`
///
/// The checks happen in this order:
/// 1. [`PathError::NotAFile`] if `path` is not an existing regular file
/// 2. [`PathError::WrongExtension`] unless the file name ends in `.xes` or `.xes.gz` (ignoring case)
/// 3. [`FormatError::UnrecognizedContent`] if no parser accepts the content
///
/// Afterwards, the log is parsed and (if [`LoadOptions::sort_by_timestamp`] is set) sorted.
///
pub fn load_xes_with_sink(
    path: impl AsRef<Path>,
    options: LoadOptions,
    sink: impl DiagnosticSink,
) -> Result<EventLog, Error> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PathError::NotAFile(path.to_path_buf()).into());
    }
    if !has_xes_extension(path) {
        return Err(PathError::WrongExtension(path.to_path_buf()).into());
    }
    let encoding = detect_encoding(path)?
        .ok_or_else(|| FormatError::UnrecognizedContent(path.to_path_buf()))?;

    let reader = open(path)?;
    let mut log = match encoding {
        XesEncoding::Plain => import_xes_with_sink(reader, options.import, sink)?,
        XesEncoding::Gzip => {
            import_xes_with_sink(BufReader::new(GzDecoder::new(reader)), options.import, sink)?
        }
    };
    tracing::debug!(
        path = %path.display(),
        %encoding,
        traces = log.traces.len(),
        events = log.num_events(),
        "loaded event log"
    );

    if options.sort_by_timestamp {
        match &options.priority_classes {
            Some(classes) => sort_log_with_priority(&mut log, classes)?,
            None => sort_log(&mut log)?,
        }
    }
    Ok(log)
}

/// Write `log` as XES XML to `writer`
pub fn write_xes<W: Write>(log: &EventLog, writer: W) -> Result<(), SerializationError> {
    export_xes_event_log(writer, log)?;
    Ok(())
}

///
/// Save `log` as XES to `path`, creating missing parent directories
///
/// The output is gzip-compressed if the file name ends in `.gz`.
///
pub fn save_xes(log: &EventLog, path: impl AsRef<Path>) -> Result<(), SerializationError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SerializationError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let write_error = |source| SerializationError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(write_error)?);
    let is_gz = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if is_gz {
        let mut encoder = GzEncoder::new(&mut writer, Compression::default());
        export_xes_event_log(&mut encoder, log)?;
        encoder.finish().map_err(write_error)?;
    } else {
        export_xes_event_log(&mut writer, log)?;
    }
    writer.flush().map_err(write_error)?;
    tracing::debug!(
        path = %path.display(),
        traces = log.traces.len(),
        compressed = is_gz,
        "saved event log"
    );
    Ok(())
}

///
/// Serialize an [`EventLog`] to JSON
///
/// Dates are stored as milliseconds since the Unix epoch, so sub-millisecond precision is lost
/// (unlike XES, which keeps the full RFC 3339 value).
///
pub fn event_log_to_json(log: &EventLog) -> Result<String, serde_json::Error> {
    serde_json::to_string(log)
}

/// Deserialize an [`EventLog`] from JSON (as produced by [`event_log_to_json`])
pub fn json_to_event_log(json: &str) -> Result<EventLog, serde_json::Error> {
    serde_json::from_str(json)
}
