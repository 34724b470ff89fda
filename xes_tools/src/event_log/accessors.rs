//! Extraction of the commonly used attributes (event name, trace id, timestamps)
//!
//! All lookups are strict: a missing or mistyped attribute is an error, never a default value.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::{ElementKind, FormatError};

use super::{
    constants::{ACTIVITY_NAME, TIMESTAMP_KEY, TRACE_ID_NAME},
    timestamp::parse_timestamp,
    Attributes, AttributeValue, Event, EventLog, Trace, XESEditableAttribute,
};

fn string_attribute<'a>(
    attributes: &'a Attributes,
    key: &'static str,
    element: ElementKind,
) -> Result<&'a str, FormatError> {
    let attr = attributes
        .get_by_key(key)
        .ok_or(FormatError::MissingAttribute { key, element })?;
    match &attr.value {
        AttributeValue::String(s) => Ok(s),
        other => Err(FormatError::InvalidAttribute {
            key,
            element,
            value: other.to_string(),
        }),
    }
}

/// Name (`concept:name`) of an event
pub fn event_name(event: &Event) -> Result<&str, FormatError> {
    string_attribute(&event.attributes, ACTIVITY_NAME, ElementKind::Event)
}

/// Identifier (`concept:name`) of a trace
pub fn trace_id(trace: &Trace) -> Result<&str, FormatError> {
    string_attribute(&trace.attributes, TRACE_ID_NAME, ElementKind::Trace)
}

///
/// Timestamp (`time:timestamp`) of an event
///
/// Accepts `<date>` attributes as well as string attributes holding an ISO 8601 date-time.
///
pub fn event_timestamp(event: &Event) -> Result<DateTime<Utc>, FormatError> {
    let attr = event
        .attributes
        .get_by_key(TIMESTAMP_KEY)
        .ok_or(FormatError::MissingAttribute {
            key: TIMESTAMP_KEY,
            element: ElementKind::Event,
        })?;
    let parsed = match &attr.value {
        AttributeValue::Date(dt) => Some(*dt),
        AttributeValue::String(s) => parse_timestamp(s, None).map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    };
    parsed.ok_or_else(|| FormatError::InvalidAttribute {
        key: TIMESTAMP_KEY,
        element: ElementKind::Event,
        value: attr.value.to_string(),
    })
}

/// Timestamp of the first event of a trace
pub fn trace_timestamp(trace: &Trace) -> Result<DateTime<Utc>, FormatError> {
    trace
        .events
        .first()
        .ok_or(FormatError::EmptyTrace)
        .and_then(event_timestamp)
}

/// Set of all event names (activities) occurring in the log
pub fn activities(log: &EventLog) -> Result<HashSet<String>, FormatError> {
    let mut result = HashSet::new();
    for event in log.traces.iter().flat_map(|t| &t.events) {
        let name = event_name(event)?;
        if !result.contains(name) {
            result.insert(name.to_string());
        }
    }
    Ok(result)
}

impl Event {
    /// See [`event_name`]
    pub fn name(&self) -> Result<&str, FormatError> {
        event_name(self)
    }

    /// See [`event_timestamp`]
    pub fn timestamp(&self) -> Result<DateTime<Utc>, FormatError> {
        event_timestamp(self)
    }
}

impl Trace {
    /// See [`trace_id`]
    pub fn id(&self) -> Result<&str, FormatError> {
        trace_id(self)
    }

    /// See [`trace_timestamp`]
    pub fn timestamp(&self) -> Result<DateTime<Utc>, FormatError> {
        trace_timestamp(self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::event_log::Attribute;

    fn event(attrs: Vec<(&str, AttributeValue)>) -> Event {
        Event {
            attributes: attrs
                .into_iter()
                .map(|(k, v)| Attribute::new(k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_event_name() {
        let e = Event::new("Register".to_string());
        assert_eq!(event_name(&e).unwrap(), "Register");
        assert!(matches!(
            event_name(&Event::default()),
            Err(FormatError::MissingAttribute {
                key: "concept:name",
                element: ElementKind::Event
            })
        ));
        let e = event(vec![("concept:name", AttributeValue::Int(3))]);
        assert!(matches!(
            event_name(&e),
            Err(FormatError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_trace_id() {
        let mut trace = Trace::default();
        assert!(trace_id(&trace).is_err());
        trace.attributes.add_to_attributes(
            "concept:name".to_string(),
            AttributeValue::String("case-7".to_string()),
        );
        assert_eq!(trace.id().unwrap(), "case-7");
    }

    #[test]
    fn test_event_timestamp() {
        let expected = Utc.with_ymd_and_hms(2011, 3, 2, 12, 0, 0).unwrap();
        let e = event(vec![("time:timestamp", AttributeValue::Date(expected))]);
        assert_eq!(event_timestamp(&e).unwrap(), expected);

        let e = event(vec![(
            "time:timestamp",
            AttributeValue::String("2011-03-02T13:00:00+01:00".to_string()),
        )]);
        assert_eq!(event_timestamp(&e).unwrap(), expected);

        let e = event(vec![(
            "time:timestamp",
            AttributeValue::String("not a date".to_string()),
        )]);
        assert!(matches!(
            event_timestamp(&e),
            Err(FormatError::InvalidAttribute { value, .. }) if value == "not a date"
        ));

        let e = event(vec![("time:timestamp", AttributeValue::None())]);
        assert!(matches!(
            event_timestamp(&e),
            Err(FormatError::InvalidAttribute { .. })
        ));
        assert!(matches!(
            event_timestamp(&Event::default()),
            Err(FormatError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_trace_timestamp() {
        assert!(matches!(
            trace_timestamp(&Trace::default()),
            Err(FormatError::EmptyTrace)
        ));
        let first = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let trace = Trace::from_events(vec![
            Event::with_timestamp("A".to_string(), first),
            Event::with_timestamp("B".to_string(), second),
        ]);
        // The first event counts, not the earliest one
        assert_eq!(trace.timestamp().unwrap(), first);
    }

    #[test]
    fn test_activities() {
        let log = EventLog::from_traces(vec![
            Trace::from_events(vec![
                Event::new("A".to_string()),
                Event::new("B".to_string()),
            ]),
            Trace::from_events(vec![Event::new("A".to_string())]),
        ]);
        let acts = activities(&log).unwrap();
        assert_eq!(acts.len(), 2);
        assert!(acts.contains("A") && acts.contains("B"));
    }
}
