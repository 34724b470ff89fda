use std::{io::BufRead, iter::FusedIterator, str::FromStr};

use quick_xml::{escape::unescape, events::BytesStart, Reader};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnostics::{Diagnostic, DiagnosticSink};

use super::{
    event_log_struct::{EventLogClassifier, EventLogExtension},
    import_xes::{XESImportOptions, XESParseError},
    timestamp::parse_timestamp,
    Attribute, AttributeValue, Attributes, Event, Trace,
};

/// (Global) log data parsed during streaming
///
/// According to the XES standard, all of this data occurs before the first trace.
/// Thus, __for XES-compliant logs it is complete once the first trace was emitted__.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XESOuterLogData {
    /// Declared XES extensions
    pub extensions: Vec<EventLogExtension>,
    /// Declared event classifiers
    pub classifiers: Vec<EventLogClassifier>,
    /// Log-level attributes
    pub log_attributes: Attributes,
    /// Default trace attribute values (`<global scope="trace">`)
    pub global_trace_attrs: Attributes,
    /// Default event attribute values (`<global scope="event">`)
    pub global_event_attrs: Attributes,
}

///
/// Element whose attributes are currently being parsed (i.e., which tag is currently open)
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Log,
    GlobalTraceAttributes,
    GlobalEventAttributes,
    Trace,
    Event,
    /// After `</log>`
    Closed,
}

/// An attribute element which was opened but not yet closed
#[derive(Debug)]
struct OpenAttribute {
    attribute: Attribute,
    /// `false` if this attribute (or one of its parents) is skipped
    keep: bool,
}

struct ParserState<'a> {
    options: XESImportOptions,
    sink: Box<dyn DiagnosticSink + 'a>,
    scope: Scope,
    current_trace: Option<Trace>,
    open_attributes: Vec<OpenAttribute>,
    /// Whether a (top-level) log tag was encountered yet (see [`XESParseError::NoTopLevelLog`])
    encountered_log: bool,
    /// Number of top-level attributes skipped because of the allow-lists in [`XESImportOptions`]
    ignored_attributes: usize,
    log_data: XESOuterLogData,
}

///
/// Streaming XES parser over [`Trace`]s
///
/// Created by [`stream_xes`]. Iterating yields one trace at a time; if parsing fails, iteration stops and the
/// error is stored in [`XESTraceStream::error`].
///
pub struct XESTraceStream<'a> {
    reader: Reader<Box<dyn BufRead + 'a>>,
    buf: Vec<u8>,
    state: ParserState<'a>,
    finished: bool,
    /// Error which terminated the stream (if any)
    pub error: Option<XESParseError>,
}

impl std::fmt::Debug for XESTraceStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XESTraceStream")
            .field("finished", &self.finished)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

///
/// Stream XES [`Trace`]s from a reader
///
/// Non-fatal problems in the input are reported to `sink`.
///
pub fn stream_xes<'a, R>(
    reader: R,
    options: XESImportOptions,
    sink: impl DiagnosticSink + 'a,
) -> XESTraceStream<'a>
where
    R: BufRead + 'a,
{
    let boxed: Box<dyn BufRead + 'a> = Box::new(reader);
    let mut reader = Reader::from_reader(boxed);
    reader.config_mut().trim_text(true);
    // Every element is then reported as Start + End, which keeps nesting handling in one place
    reader.config_mut().expand_empty_elements = true;
    XESTraceStream {
        reader,
        buf: Vec::new(),
        state: ParserState {
            options,
            sink: Box::new(sink),
            scope: Scope::Log,
            current_trace: None,
            open_attributes: Vec::new(),
            encountered_log: false,
            ignored_attributes: 0,
            log_data: XESOuterLogData::default(),
        },
        finished: false,
        error: None,
    }
}

impl XESTraceStream<'_> {
    /// Parse until the next trace is complete
    ///
    /// Returns `Ok(None)` once the end of the input is reached.
    pub fn next_trace(&mut self) -> Result<Option<Trace>, XESParseError> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                quick_xml::events::Event::Start(t) => self.state.start_element(&t)?,
                quick_xml::events::Event::End(t) => {
                    if let Some(trace) = self.state.end_element(t.local_name().as_ref())? {
                        return Ok(Some(trace));
                    }
                }
                quick_xml::events::Event::Eof => {
                    if !self.state.encountered_log {
                        // Without a (top-level) log tag this is not a valid XES file
                        return Err(XESParseError::NoTopLevelLog);
                    }
                    self.state.report_ignored_attributes();
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Log-level data parsed so far
    pub fn log_data(&self) -> &XESOuterLogData {
        &self.state.log_data
    }

    /// Consume the stream, returning the parsed log-level data
    pub fn into_log_data(self) -> XESOuterLogData {
        self.state.log_data
    }
}

impl Iterator for XESTraceStream<'_> {
    type Item = Trace;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_trace() {
            Ok(Some(trace)) => Some(trace),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                self.error = Some(e);
                None
            }
        }
    }
}

impl FusedIterator for XESTraceStream<'_> {}

impl ParserState<'_> {
    fn warn(&mut self, message: String) {
        self.sink.report(Diagnostic::warning(message));
    }

    /// Whether `name` is the `<values>` wrapper of an open `<list>` (which does not form an attribute itself)
    fn is_list_values_wrapper(&self, name: &[u8]) -> bool {
        name == b"values"
            && self
                .open_attributes
                .last()
                .is_some_and(|open| matches!(open.attribute.value, AttributeValue::List(_)))
    }

    fn report_ignored_attributes(&mut self) {
        let count = std::mem::take(&mut self.ignored_attributes);
        if count > 0 {
            self.sink.report(Diagnostic::info(format!(
                "Ignored {count} attributes not included in the attribute allow-lists"
            )));
        }
    }

    fn start_element(&mut self, t: &BytesStart<'_>) -> Result<(), XESParseError> {
        if self.is_list_values_wrapper(t.local_name().as_ref()) {
            return Ok(());
        }
        if !self.open_attributes.is_empty() {
            return self.open_attribute(t);
        }
        match t.local_name().as_ref() {
            b"log" => {
                self.encountered_log = true;
                self.scope = Scope::Log;
            }
            _ if !self.encountered_log => return Err(XESParseError::NoTopLevelLog),
            b"extension" => {
                let extension = EventLogExtension {
                    name: self.required_xml_attribute(t, "name")?,
                    prefix: self.required_xml_attribute(t, "prefix")?,
                    uri: self.required_xml_attribute(t, "uri")?,
                };
                self.log_data.extensions.push(extension);
            }
            b"classifier" => {
                let classifier = EventLogClassifier {
                    name: self.required_xml_attribute(t, "name")?,
                    keys: EventLogClassifier::parse_keys(&self.required_xml_attribute(t, "keys")?),
                };
                self.log_data.classifiers.push(classifier);
            }
            b"global" => match xml_attribute(t, "scope")?.as_deref() {
                Some("trace") => self.scope = Scope::GlobalTraceAttributes,
                Some("event") => self.scope = Scope::GlobalEventAttributes,
                Some(_) => return Err(XESParseError::InvalidKeyValue("scope")),
                None => return Err(XESParseError::MissingKey("scope")),
            },
            b"trace" => {
                if self.current_trace.is_some() {
                    self.warn("Nested trace; discarding the unfinished outer trace".to_string());
                }
                self.scope = Scope::Trace;
                self.current_trace = Some(Trace {
                    attributes: Attributes::with_capacity(10),
                    events: Vec::with_capacity(10),
                });
            }
            b"event" => {
                match &mut self.current_trace {
                    Some(trace) => trace.events.push(Event {
                        attributes: Attributes::with_capacity(10),
                    }),
                    None => self.warn("Event outside of a trace; it will be skipped".to_string()),
                }
                self.scope = Scope::Event;
            }
            _ => return self.open_attribute(t),
        }
        Ok(())
    }

    fn end_element(&mut self, name: &[u8]) -> Result<Option<Trace>, XESParseError> {
        if self.is_list_values_wrapper(name) {
            return Ok(None);
        }
        if !self.open_attributes.is_empty() {
            self.close_attribute()?;
            return Ok(None);
        }
        match name {
            b"log" => self.scope = Scope::Closed,
            b"global" => self.scope = Scope::Log,
            b"trace" => {
                self.scope = Scope::Log;
                return Ok(self.current_trace.take().map(|mut trace| {
                    trace.events.shrink_to_fit();
                    trace.attributes.shrink_to_fit();
                    trace
                }));
            }
            b"event" => {
                self.scope = if self.current_trace.is_some() {
                    Scope::Trace
                } else {
                    Scope::Log
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn open_attribute(&mut self, t: &BytesStart<'_>) -> Result<(), XESParseError> {
        if self.scope == Scope::Closed {
            return Err(XESParseError::AttributeOutsideLog);
        }
        let key = match xml_attribute(t, "key")? {
            Some(key) => key,
            None => {
                self.warn(format!(
                    "Attribute element <{}> without key; assuming empty key",
                    String::from_utf8_lossy(t.local_name().as_ref())
                ));
                String::new()
            }
        };
        let keep = match self.open_attributes.last() {
            Some(parent) => parent.keep,
            None => {
                let allowed = self.is_attribute_allowed(&key);
                if !allowed {
                    self.ignored_attributes += 1;
                }
                allowed
            }
        };
        let (value, keep) = if keep {
            match self.parse_attribute_value(t, &key)? {
                Some(value) => (value, true),
                None => (AttributeValue::None(), false),
            }
        } else {
            (AttributeValue::None(), false)
        };
        self.open_attributes.push(OpenAttribute {
            attribute: Attribute::new(key, value),
            keep,
        });
        Ok(())
    }

    fn close_attribute(&mut self) -> Result<(), XESParseError> {
        let Some(OpenAttribute { attribute, keep }) = self.open_attributes.pop() else {
            return Ok(());
        };
        if !keep {
            return Ok(());
        }
        match self.open_attributes.last_mut() {
            Some(parent) => {
                let parent = &mut parent.attribute;
                match &mut parent.value {
                    AttributeValue::List(children) | AttributeValue::Container(children) => {
                        children.push(attribute)
                    }
                    _ => parent
                        .own_attributes
                        .get_or_insert_with(Attributes::new)
                        .push(attribute),
                }
            }
            None => self.attach_to_scope(attribute)?,
        }
        Ok(())
    }

    fn attach_to_scope(&mut self, attribute: Attribute) -> Result<(), XESParseError> {
        match self.scope {
            Scope::Log => self.log_data.log_attributes.push(attribute),
            Scope::GlobalTraceAttributes => self.log_data.global_trace_attrs.push(attribute),
            Scope::GlobalEventAttributes => self.log_data.global_event_attrs.push(attribute),
            Scope::Trace => match &mut self.current_trace {
                Some(trace) => trace.attributes.push(attribute),
                None => self.warn(format!(
                    "No current trace for trace attribute {:?}",
                    attribute.key
                )),
            },
            Scope::Event => match self
                .current_trace
                .as_mut()
                .and_then(|trace| trace.events.last_mut())
            {
                Some(event) => event.attributes.push(attribute),
                None => self.warn(format!(
                    "No current event for event attribute {:?}",
                    attribute.key
                )),
            },
            Scope::Closed => return Err(XESParseError::AttributeOutsideLog),
        }
        Ok(())
    }

    fn is_attribute_allowed(&self, key: &str) -> bool {
        let allowlist = match self.scope {
            Scope::Log => &self.options.ignore_log_attributes_except,
            Scope::Trace => &self.options.ignore_trace_attributes_except,
            Scope::Event => &self.options.ignore_event_attributes_except,
            _ => return true,
        };
        allowlist
            .as_ref()
            .map_or(true, |allowed| allowed.contains(key))
    }

    ///
    /// Parse the value of an attribute element
    ///
    /// Returns `None` if the element is not a known XES attribute type.
    /// Values which cannot be parsed are represented by [`AttributeValue::None`].
    ///
    fn parse_attribute_value(
        &mut self,
        t: &BytesStart<'_>,
        key: &str,
    ) -> Result<Option<AttributeValue>, XESParseError> {
        let type_name = t.local_name();
        let type_name = type_name.as_ref();
        match type_name {
            b"list" => return Ok(Some(AttributeValue::List(Vec::new()))),
            b"container" => return Ok(Some(AttributeValue::Container(Attributes::new()))),
            b"string" | b"date" | b"int" | b"float" | b"boolean" | b"id" => {}
            other => {
                self.warn(format!(
                    "Attribute type not implemented '{}' (key {key:?}); skipping it",
                    String::from_utf8_lossy(other)
                ));
                return Ok(None);
            }
        }
        let Some(value) = xml_attribute(t, "value")? else {
            self.warn(format!("Attribute {key:?} has no value"));
            return Ok(Some(AttributeValue::None()));
        };
        if type_name == b"string" {
            return Ok(Some(AttributeValue::String(value)));
        }
        let parsed = match type_name {
            b"date" => parse_timestamp(&value, self.options.date_format.as_deref())
                .map(|dt| AttributeValue::Date(dt.into())),
            b"int" => value.trim().parse::<i64>().ok().map(AttributeValue::Int),
            b"float" => value.trim().parse::<f64>().ok().map(AttributeValue::Float),
            b"boolean" => match value.trim() {
                v if v.eq_ignore_ascii_case("true") => Some(AttributeValue::Boolean(true)),
                v if v.eq_ignore_ascii_case("false") => Some(AttributeValue::Boolean(false)),
                _ => None,
            },
            _ => Uuid::from_str(value.trim()).ok().map(AttributeValue::ID),
        };
        Ok(Some(parsed.unwrap_or_else(|| {
            self.warn(format!(
                "Could not parse {} value {value:?} of attribute {key:?}",
                String::from_utf8_lossy(type_name)
            ));
            AttributeValue::None()
        })))
    }

    fn required_xml_attribute(
        &mut self,
        t: &BytesStart<'_>,
        key: &'static str,
    ) -> Result<String, XESParseError> {
        match xml_attribute(t, key)? {
            Some(value) => Ok(value),
            None => {
                self.warn(format!(
                    "Did not find expected XML attribute {key:?} on <{}>; assuming empty string",
                    String::from_utf8_lossy(t.local_name().as_ref())
                ));
                Ok(String::new())
            }
        }
    }
}

/// Read and unescape an XML attribute of the given tag
fn xml_attribute(t: &BytesStart<'_>, key: &str) -> Result<Option<String>, XESParseError> {
    let attr = t.try_get_attribute(key).map_err(quick_xml::Error::from)?;
    Ok(attr.map(|a| decode_xml_value(&a.value)))
}

fn decode_xml_value(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(s) => match unescape(s) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => s.to_string(),
        },
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}
