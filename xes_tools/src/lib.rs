#![warn(
    clippy::doc_markdown,
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs
)]

#![doc = include_str!("../README.md")]

///
/// XES event logs: object model, import and export
///
pub mod event_log {
    /// Strict extraction of event names, trace ids and timestamps
    pub mod accessors;
    /// Constants
    pub mod constants;
    /// [`EventLog`] struct and sub-structs
    pub mod event_log_struct;
    /// XES Export
    pub mod export_xes;
    /// XES Import
    pub mod import_xes;
    /// Streaming XES Import
    pub mod stream_xes;
    /// Parsing of XES timestamps
    pub mod timestamp;
    pub use event_log_struct::{
        Attribute, AttributeValue, Attributes, Event, EventLog, Trace, XESEditableAttribute,
    };
    #[cfg(test)]
    mod tests;
}

/// Conversion between label sequences and traces
pub mod convert;
/// Reporting of non-fatal problems encountered while parsing
pub mod diagnostics;
/// Error types
pub mod error;
/// Loading and saving XES files
pub mod io;
/// Sorting traces and events by timestamp
pub mod normalize;

/// Util module with smaller helper functions, structs or enums
pub mod utils;

#[doc(inline)]
pub use event_log::event_log_struct::EventLog;

#[doc(inline)]
pub use event_log::import_xes::import_xes_slice;

#[doc(inline)]
pub use event_log::import_xes::XESImportOptions;

#[doc(inline)]
pub use event_log::stream_xes::stream_xes;

#[doc(inline)]
pub use error::Error;

#[doc(inline)]
pub use io::{can_parse, detect_encoding, load_xes, save_xes, LoadOptions, XesEncoding};

#[doc(inline)]
pub use normalize::{canonical_trace_string, is_log_sorted, sort_log, sort_log_with_priority};

#[doc(inline)]
pub use convert::{trace_from_labels, trace_to_labels};
