/// Key of the activity name of events (concept XES extension)
///
/// Also used as the event class by the normalization and conversion helpers.
pub const ACTIVITY_NAME: &str = "concept:name";
/// Key of the trace identifier (concept XES extension)
///
/// See also [`ACTIVITY_NAME`]
pub const TRACE_ID_NAME: &str = "concept:name";
/// Key of the event timestamp (time XES extension)
pub const TIMESTAMP_KEY: &str = "time:timestamp";
/// Accepted (lower-case) file name suffixes of plain XES files
pub const XES_EXTENSION: &str = ".xes";
/// Accepted (lower-case) file name suffix of gzip-compressed XES files
pub const XES_GZ_EXTENSION: &str = ".xes.gz";
/// Magic bytes at the start of every gzip stream
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
