//!
//! Deterministic ordering of traces and events by timestamp
//!
//! Events of each trace are ordered by their `time:timestamp`, optionally breaking ties by the position of the
//! event's name in a list of _priority classes_. Traces are then ordered by the timestamp of their first event.
//! All sorts are stable.
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use xes_tools::event_log::{Event, EventLog, Trace};
//! use xes_tools::normalize::{canonical_trace_string, is_log_sorted, sort_log_with_priority};
//!
//! let t = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
//! let mut log = EventLog::from_traces(vec![Trace::from_events(vec![
//!     Event::with_timestamp("C".to_string(), t),
//!     Event::with_timestamp("A".to_string(), t),
//!     Event::with_timestamp("B".to_string(), t),
//! ])]);
//! sort_log_with_priority(&mut log, &["A", "B", "C"]).unwrap();
//! assert_eq!(canonical_trace_string(&log.traces[0]).unwrap(), "$A$B$C");
//! assert!(is_log_sorted(&log).unwrap());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    error::FormatError,
    event_log::{
        accessors::{event_name, event_timestamp},
        constants::ACTIVITY_NAME,
        Event, EventLog, Trace, XESEditableAttribute,
    },
};

/// Prefix of every event name in a canonical trace string
pub const CANONICAL_DELIMITER: char = '$';
/// Escape character used inside canonical trace strings
const CANONICAL_ESCAPE: char = '\\';

/// Rank of event classes given as an ordered list; unlisted classes rank last
#[derive(Debug, Clone, Default)]
struct ClassPriority<'p> {
    ranks: HashMap<&'p str, usize>,
}

impl<'p> ClassPriority<'p> {
    fn new<S: AsRef<str>>(classes: &'p [S]) -> Self {
        let mut ranks = HashMap::with_capacity(classes.len());
        for (rank, class) in classes.iter().enumerate() {
            // First occurrence wins
            ranks.entry(class.as_ref()).or_insert(rank);
        }
        Self { ranks }
    }

    fn rank(&self, event: &Event) -> usize {
        event
            .attributes
            .get_by_key(ACTIVITY_NAME)
            .and_then(|a| a.value.try_as_string())
            .and_then(|name| self.ranks.get(name.as_str()).copied())
            .unwrap_or(usize::MAX)
    }
}

/// Sort key of an event: timestamp, then class rank
type EventKey = (DateTime<Utc>, usize);

fn event_keys(trace: &Trace, priority: Option<&ClassPriority<'_>>) -> Result<Vec<EventKey>, FormatError> {
    trace
        .events
        .iter()
        .map(|e| Ok((event_timestamp(e)?, priority.map_or(0, |p| p.rank(e)))))
        .collect()
}

/// Stable reorder of `items` by `keys` (one key per item), moving the items instead of cloning them
fn reorder_by_keys<T, K: Ord>(items: &mut Vec<T>, keys: Vec<K>) {
    debug_assert_eq!(items.len(), keys.len());
    if keys.windows(2).all(|w| w[0] <= w[1]) {
        return;
    }
    let mut keyed: Vec<(K, T)> = keys.into_iter().zip(items.drain(..)).collect();
    // `sort_by` is stable
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    items.extend(keyed.into_iter().map(|(_, item)| item));
}

fn sort_log_inner(log: &mut EventLog, priority: Option<&ClassPriority<'_>>) -> Result<(), FormatError> {
    // Compute every key before moving anything, so that an error leaves the log untouched
    let all_event_keys = log
        .traces
        .iter()
        .map(|t| event_keys(t, priority))
        .collect::<Result<Vec<_>, _>>()?;
    // After sorting, the first event of a trace is the one with the minimal key
    let trace_keys: Vec<Option<DateTime<Utc>>> = all_event_keys
        .iter()
        .map(|keys| keys.iter().min().map(|(ts, _)| *ts))
        .collect();

    for (trace, keys) in log.traces.iter_mut().zip(all_event_keys) {
        reorder_by_keys(&mut trace.events, keys);
    }
    // Empty traces (key `None`) come first
    reorder_by_keys(&mut log.traces, trace_keys);
    tracing::debug!(
        traces = log.traces.len(),
        with_priority = priority.is_some(),
        "sorted event log by timestamp"
    );
    Ok(())
}

///
/// Stably sort the events of every trace by timestamp, then the traces by the timestamp of their first event
///
/// Fails with [`FormatError`] if any event lacks a parseable `time:timestamp`; the log is not modified in that case.
///
pub fn sort_log(log: &mut EventLog) -> Result<(), FormatError> {
    sort_log_inner(log, None)
}

///
/// Like [`sort_log`], but events with equal timestamps are ordered by the position of their name in
/// `priority_classes` (events whose name is not listed, or who have no name, come after all listed ones)
///
pub fn sort_log_with_priority<S: AsRef<str>>(
    log: &mut EventLog,
    priority_classes: &[S],
) -> Result<(), FormatError> {
    sort_log_inner(log, Some(&ClassPriority::new(priority_classes)))
}

/// Stably sort the events of a single trace by timestamp
pub fn sort_trace(trace: &mut Trace) -> Result<(), FormatError> {
    let keys = event_keys(trace, None)?;
    reorder_by_keys(&mut trace.events, keys);
    Ok(())
}

/// Stably sort the events of a single trace by timestamp, then by rank in `priority_classes`
pub fn sort_trace_with_priority<S: AsRef<str>>(
    trace: &mut Trace,
    priority_classes: &[S],
) -> Result<(), FormatError> {
    let keys = event_keys(trace, Some(&ClassPriority::new(priority_classes)))?;
    reorder_by_keys(&mut trace.events, keys);
    Ok(())
}

/// Whether the events of the trace are ordered by (non-decreasing) timestamp
pub fn is_trace_sorted(trace: &Trace) -> Result<bool, FormatError> {
    let timestamps = trace
        .events
        .iter()
        .map(event_timestamp)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(timestamps.windows(2).all(|w| w[0] <= w[1]))
}

///
/// Whether every trace is sorted (see [`is_trace_sorted`]) and the traces are ordered by the timestamp of
/// their first event
///
/// Priority classes are not taken into account. Empty traces count as earliest.
///
pub fn is_log_sorted(log: &EventLog) -> Result<bool, FormatError> {
    let mut last_start: Option<DateTime<Utc>> = None;
    for trace in &log.traces {
        if !is_trace_sorted(trace)? {
            return Ok(false);
        }
        let start = trace.events.first().map(event_timestamp).transpose()?;
        if start < last_start {
            return Ok(false);
        }
        last_start = start;
    }
    Ok(true)
}

///
/// Fingerprint of a trace: the names of its events in order, each prefixed with [`CANONICAL_DELIMITER`]
///
/// Occurrences of the delimiter or of `\` inside names are escaped with `\`, so
/// [`parse_canonical_trace_string`] always recovers the original names.
/// The empty trace results in the empty string.
///
pub fn canonical_trace_string(trace: &Trace) -> Result<String, FormatError> {
    let mut result = String::new();
    for event in &trace.events {
        result.push(CANONICAL_DELIMITER);
        for c in event_name(event)?.chars() {
            if c == CANONICAL_DELIMITER || c == CANONICAL_ESCAPE {
                result.push(CANONICAL_ESCAPE);
            }
            result.push(c);
        }
    }
    Ok(result)
}

/// Recover the event names from a string created by [`canonical_trace_string`]
pub fn parse_canonical_trace_string(canonical: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut chars = canonical.chars();
    while let Some(c) = chars.next() {
        match c {
            CANONICAL_DELIMITER => names.push(String::new()),
            CANONICAL_ESCAPE => {
                if let (Some(name), Some(escaped)) = (names.last_mut(), chars.next()) {
                    name.push(escaped);
                }
            }
            c => {
                if let Some(name) = names.last_mut() {
                    name.push(c);
                }
            }
        }
    }
    names
}

impl EventLog {
    /// See [`sort_log`]
    pub fn sort_by_timestamp(&mut self) -> Result<(), FormatError> {
        sort_log(self)
    }

    /// See [`sort_log_with_priority`]
    pub fn sort_by_timestamp_and_class<S: AsRef<str>>(
        &mut self,
        priority_classes: &[S],
    ) -> Result<(), FormatError> {
        sort_log_with_priority(self, priority_classes)
    }

    /// See [`is_log_sorted`]
    pub fn is_sorted_by_timestamp(&self) -> Result<bool, FormatError> {
        is_log_sorted(self)
    }
}
