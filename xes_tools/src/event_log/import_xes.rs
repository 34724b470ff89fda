use std::collections::HashSet;
use std::io::{BufRead, BufReader};

use flate2::bufread::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticSink, TracingSink};

use super::event_log_struct::{EventLog, Trace};
use super::stream_xes::stream_xes;

///
/// Error encountered while parsing XES
///
#[derive(Debug, thiserror::Error)]
pub enum XESParseError {
    /// An Attribute was encountered outside an open `<log>` tag
    #[error("attribute outside of <log>")]
    AttributeOutsideLog,
    /// There is no top-level `<log>`
    #[error("no top-level <log> element")]
    NoTopLevelLog,
    /// IO error
    #[error("IO error while reading XES: {0}")]
    IOError(#[from] std::io::Error),
    /// XML error (e.g., incorrect XML format)
    #[error("invalid XML: {0}")]
    XMLParsingError(#[from] quick_xml::Error),
    /// Missing key on XML element (with expected key included)
    #[error("missing XML attribute {0:?}")]
    MissingKey(&'static str),
    /// Invalid value of XML attribute with key (with key included)
    #[error("invalid value of XML attribute {0:?}")]
    InvalidKeyValue(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
///
/// Options for XES Import
///
/// See also [`build_ignore_attributes`] for easy construction of attribute allowlists
pub struct XESImportOptions {
    /// If Some: Ignore all top-level log attributes, except attributes with keys in the provided allowlist
    pub ignore_log_attributes_except: Option<HashSet<String>>,
    /// If Some: Ignore all trace attributes, except attributes with keys in the provided allowlist
    ///
    /// Does not affect global trace attributes
    pub ignore_trace_attributes_except: Option<HashSet<String>>,
    /// If Some: Ignore all event attributes, except attributes with keys in the provided allowlist
    ///
    /// Does not affect global event attributes
    pub ignore_event_attributes_except: Option<HashSet<String>>,
    /// Optional date format to try first when parsing `<date>` values
    ///
    /// See <https://docs.rs/chrono/latest/chrono/format/strftime/index.html> for all available specifiers.
    /// Falls back to the default formats (e.g., RFC 3339) if parsing with this format fails.
    pub date_format: Option<String>,
}

///
/// Construct a `HashSet<String>` from a _collection_ of String, &str, ...
///
/// Example usage: `build_ignore_attributes(vec!["concept:name"])`
///
pub fn build_ignore_attributes<I, S: AsRef<str>>(keys: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
{
    keys.into_iter().map(|s| s.as_ref().to_string()).collect()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Parse XES from the given reader, reporting recoverable problems to `sink`
pub fn import_xes_with_sink<T>(
    reader: T,
    options: XESImportOptions,
    sink: impl DiagnosticSink,
) -> Result<EventLog, XESParseError>
where
    T: BufRead,
{
    let mut trace_stream = stream_xes(reader, options, sink);
    let traces: Vec<Trace> = (&mut trace_stream).collect();
    if let Some(e) = trace_stream.error.take() {
        return Err(e);
    }
    let log_data = trace_stream.into_log_data();

    // Empty log-level collections are represented as `None`, matching logs created in memory
    Ok(EventLog {
        attributes: log_data.log_attributes,
        traces,
        extensions: non_empty(log_data.extensions),
        classifiers: non_empty(log_data.classifiers),
        global_trace_attrs: non_empty(log_data.global_trace_attrs),
        global_event_attrs: non_empty(log_data.global_event_attrs),
    })
}

/// Parse XES from the given reader
///
/// Recoverable problems are logged via [`tracing`] (see [`TracingSink`]).
pub fn import_xes<T>(reader: T, options: XESImportOptions) -> Result<EventLog, XESParseError>
where
    T: BufRead,
{
    import_xes_with_sink(reader, options, TracingSink)
}

///
/// Import a XES [`EventLog`] directly from a string
///
pub fn import_xes_str(xes_str: &str, options: XESImportOptions) -> Result<EventLog, XESParseError> {
    import_xes(xes_str.as_bytes(), options)
}

///
/// Import a XES [`EventLog`] from a byte slice (&\[u8\])
///
/// * `is_compressed_gz`: Parse the passed `xes_data` as a compressed .gz archive
///
pub fn import_xes_slice(
    xes_data: &[u8],
    is_compressed_gz: bool,
    options: XESImportOptions,
) -> Result<EventLog, XESParseError> {
    if is_compressed_gz {
        let gz: GzDecoder<&[u8]> = GzDecoder::new(xes_data);
        return import_xes(BufReader::new(gz), options);
    }
    import_xes(xes_data, options)
}
