use std::fmt;

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::constants::{ACTIVITY_NAME, TIMESTAMP_KEY};

///
/// Possible attribute values according to the XES Standard
///
/// ```rust
/// use xes_tools::event_log::AttributeValue;
/// let v = AttributeValue::String("Register".to_string());
///
/// assert_eq!(v.try_as_string().map(String::as_str), Some("Register"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "content")]
pub enum AttributeValue {
    /// String values
    String(String),
    #[serde(with = "ts_milliseconds")]
    /// DateTime values
    Date(DateTime<Utc>),
    /// Integer values
    Int(i64),
    /// Float values
    Float(f64),
    /// Boolean values
    Boolean(bool),
    /// IDs (UUIDs)
    ID(Uuid),
    /// Ordered child attributes (keys may repeat)
    List(Vec<Attribute>),
    /// Unordered child attributes
    Container(Attributes),
    /// Value that was present in the source but could not be parsed (e.g., a malformed date)
    None(),
}

impl AttributeValue {
    ///
    /// Returns `Some()` of inner value if value is of variant [`AttributeValue::String`] and `None` otherwise
    ///
    pub fn try_as_string(&self) -> Option<&String> {
        match self {
            AttributeValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the XES element used for this value type (e.g., `string` or `date`)
    pub fn xes_type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) | AttributeValue::None() => "string",
            AttributeValue::Date(_) => "date",
            AttributeValue::Int(_) => "int",
            AttributeValue::Float(_) => "float",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::ID(_) => "id",
            AttributeValue::List(_) => "list",
            AttributeValue::Container(_) => "container",
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Boolean(b) => write!(f, "{b}"),
            AttributeValue::ID(id) => write!(f, "{id}"),
            AttributeValue::List(l) => write!(f, "<list of {}>", l.len()),
            AttributeValue::Container(c) => write!(f, "<container of {}>", c.len()),
            AttributeValue::None() => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
///
/// Attribute made up of the key and value
///
pub struct Attribute {
    /// Attribute key
    pub key: String,
    /// Attribute value
    pub value: AttributeValue,
    /// Child attributes (nested)
    pub own_attributes: Option<Attributes>,
}

impl Attribute {
    ///
    /// Helper to create a new attribute without nested attributes
    ///
    pub fn new(key: String, attribute_val: AttributeValue) -> Self {
        Self {
            key,
            value: attribute_val,
            own_attributes: None,
        }
    }
}

///
/// Attributes are [`Vec`]s of [`Attribute`]s
///
/// See the [`XESEditableAttribute`] trait for functions to add, look up or remove attributes by key.
///
pub type Attributes = Vec<Attribute>;

///
/// Trait to easily add, look up and remove attributes
///
pub trait XESEditableAttribute {
    ///
    /// Add a new attribute (with key and value)
    ///
    /// Note: Does _not_ check if an attribute with this key was already present.
    ///
    fn add_to_attributes(&mut self, key: String, value: AttributeValue);
    ///
    /// Add a new attribute
    ///
    fn add_attribute(&mut self, attr: Attribute);
    ///
    /// Get an attribute by key
    ///
    /// _Complexity_: linear lookup
    fn get_by_key(&self, key: &str) -> Option<&Attribute>;
    ///
    /// Get an attribute as mutable by key
    ///
    fn get_by_key_mut(&mut self, key: &str) -> Option<&mut Attribute>;
    ///
    /// Get an attribute by key or the default value provided by global attributes
    ///
    fn get_by_key_or_global<'a>(
        &'a self,
        key: &str,
        global_attrs: &'a Option<Attributes>,
    ) -> Option<&'a Attribute>;
    ///
    /// Remove attribute with given key
    ///
    /// Returns `true` if the attribute was present and `false` otherwise
    ///
    fn remove_with_key(&mut self, key: &str) -> bool;
}

impl XESEditableAttribute for Attributes {
    fn add_to_attributes(&mut self, key: String, value: AttributeValue) {
        self.push(Attribute::new(key, value));
    }

    fn add_attribute(&mut self, a: Attribute) {
        self.push(a);
    }

    fn get_by_key(&self, key: &str) -> Option<&Attribute> {
        self.iter().find(|attr| attr.key == key)
    }

    fn get_by_key_mut(&mut self, key: &str) -> Option<&mut Attribute> {
        self.iter_mut().find(|attr| attr.key == key)
    }

    fn get_by_key_or_global<'a>(
        &'a self,
        key: &str,
        global_attrs: &'a Option<Attributes>,
    ) -> Option<&'a Attribute> {
        self.get_by_key(key).or_else(|| {
            global_attrs
                .as_ref()
                .and_then(|global_attrs| global_attrs.get_by_key(key))
        })
    }

    fn remove_with_key(&mut self, key: &str) -> bool {
        match self.iter().position(|a| a.key == key) {
            Some(index) => {
                self.remove(index);
                true
            }
            None => false,
        }
    }
}

///
/// An event consists of multiple (event) attributes ([Attributes])
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Event {
    /// Event attributes
    pub attributes: Attributes,
}

impl Event {
    /// Create a new event with the provided activity (stored under [`ACTIVITY_NAME`])
    pub fn new(activity: String) -> Self {
        Event {
            attributes: vec![Attribute::new(
                ACTIVITY_NAME.to_string(),
                AttributeValue::String(activity),
            )],
        }
    }

    /// Create a new event with the provided activity and timestamp (stored under [`TIMESTAMP_KEY`])
    pub fn with_timestamp(activity: String, timestamp: DateTime<Utc>) -> Self {
        let mut event = Event::new(activity);
        event
            .attributes
            .add_to_attributes(TIMESTAMP_KEY.to_string(), AttributeValue::Date(timestamp));
        event
    }
}

///
/// A trace consists of a list of events and trace attributes (See also [`Event`] and [`Attributes`])
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Trace {
    /// Trace-level attributes
    pub attributes: Attributes,
    /// Events contained in trace
    pub events: Vec<Event>,
}

impl Trace {
    /// Create a trace without attributes from the given events
    pub fn from_events(events: Vec<Event>) -> Self {
        Trace {
            attributes: Attributes::new(),
            events,
        }
    }
}

///
/// Event log consisting of a list of [`Trace`]s and log [`Attributes`]
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventLog {
    /// Top-level attributes
    pub attributes: Attributes,
    /// Traces contained in log
    pub traces: Vec<Trace>,
    /// XES Extensions
    pub extensions: Option<Vec<EventLogExtension>>,
    /// XES Event classifiers
    pub classifiers: Option<Vec<EventLogClassifier>>,
    /// Global trace attributes
    pub global_trace_attrs: Option<Attributes>,
    ///  Global event attributes
    pub global_event_attrs: Option<Attributes>,
}

impl EventLog {
    /// Create a log without any log-level data from the given traces
    pub fn from_traces(traces: Vec<Trace>) -> Self {
        EventLog {
            traces,
            ..EventLog::default()
        }
    }

    ///
    /// Try to get the [`EventLogClassifier`] with the associated name
    ///
    pub fn get_classifier_by_name(&self, name: &str) -> Option<&EventLogClassifier> {
        self.classifiers
            .as_ref()
            .and_then(|classifiers| classifiers.iter().find(|c| c.name == name))
    }

    /// Total number of events over all traces
    pub fn num_events(&self) -> usize {
        self.traces.iter().map(|t| t.events.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// An XES Extension
pub struct EventLogExtension {
    /// Extension name
    pub name: String,
    /// Prefix of attributes defined by the extension
    pub prefix: String,
    /// URI pointing to XESEXT of the XES extension
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Event classifier
///
/// Classifies events by the values of a set of attribute keys (the _class identity_)
pub struct EventLogClassifier {
    /// Name of the classifier
    pub name: String,
    /// Attribute keys making up the class identity
    pub keys: Vec<String>,
}

impl EventLogClassifier {
    /// Delimiter for joining the classifier values into a single class identity
    pub const DELIMITER: &'static str = "+";

    ///
    /// Get the class identity (joined with [`EventLogClassifier::DELIMITER`])
    ///
    /// Missing attributes and non-string attributes are represented by an empty String.
    ///
    pub fn get_class_identity(&self, ev: &Event) -> String {
        self.keys
            .iter()
            .map(|k| {
                ev.attributes
                    .get_by_key(k)
                    .and_then(|a| a.value.try_as_string())
                    .map(String::as_str)
                    .unwrap_or_default()
            })
            .collect::<Vec<&str>>()
            .join(Self::DELIMITER)
    }

    ///
    /// Parse the `keys` XML attribute of a `<classifier>` element
    ///
    /// Keys are separated by spaces; keys containing spaces are wrapped in single quotes.
    ///
    pub fn parse_keys(keys: &str) -> Vec<String> {
        let mut parsed = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        for c in keys.chars() {
            match c {
                '\'' => {
                    if quoted {
                        parsed.push(std::mem::take(&mut current));
                    }
                    quoted = !quoted;
                }
                ' ' if !quoted => {
                    if !current.is_empty() {
                        parsed.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            }
        }
        if !current.is_empty() {
            parsed.push(current);
        }
        parsed
    }

    ///
    /// Inverse of [`EventLogClassifier::parse_keys`]
    ///
    pub fn serialize_keys(&self) -> String {
        if self.keys.iter().any(|key| key.contains(' ')) {
            self.keys
                .iter()
                .map(|k| format!("'{k}'"))
                .collect::<Vec<String>>()
                .join(" ")
        } else {
            self.keys.join(" ")
        }
    }
}
