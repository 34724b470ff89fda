//! Conversion between plain label sequences and [`Trace`]s

use chrono::{DateTime, Utc};

use crate::{
    error::FormatError,
    event_log::{accessors::event_name, Event, Trace},
};

///
/// Build a trace with one event per label
///
/// Every event gets `concept:name` set to its label and `time:timestamp` set to the current time.
/// All events share the same timestamp, so that (stable) sorting keeps the label order.
///
pub fn trace_from_labels<I, S>(labels: I) -> Trace
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    trace_from_labels_at(labels, Utc::now())
}

/// Like [`trace_from_labels`], but with an explicit timestamp for all events
pub fn trace_from_labels_at<I, S>(labels: I, timestamp: DateTime<Utc>) -> Trace
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Trace::from_events(
        labels
            .into_iter()
            .map(|label| Event::with_timestamp(label.into(), timestamp))
            .collect(),
    )
}

/// Event names of a trace, in order
pub fn trace_to_labels(trace: &Trace) -> Result<Vec<String>, FormatError> {
    trace
        .events
        .iter()
        .map(|e| event_name(e).map(str::to_string))
        .collect()
}
