use std::io::Write;

use chrono::{DateTime, Utc};
use flate2::{write::GzEncoder, Compression};

use crate::event_log::{
    import_xes::{import_xes_slice, import_xes_str, XESImportOptions, XESParseError},
    AttributeValue, XESEditableAttribute,
};

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_xes_gz_import() {
    let x = include_bytes!("test_data/repair_small.xes");
    let log = import_xes_slice(&gzip(x), true, XESImportOptions::default()).unwrap();
    assert_eq!(log.traces.len(), 3);

    // Case "100" has 3 events
    let case_100 = log
        .traces
        .iter()
        .find(|t| t.id().is_ok_and(|id| id == "100"))
        .unwrap();
    let acts: Vec<&str> = case_100
        .events
        .iter()
        .map(|e| e.name().unwrap())
        .collect();
    assert_eq!(acts, vec!["Register", "Inform User", "Archive Repair"]);

    // Offsets are normalized to UTC
    assert_eq!(
        case_100.events[0]
            .attributes
            .get_by_key("time:timestamp")
            .unwrap()
            .value,
        AttributeValue::Date(
            DateTime::parse_from_rfc3339("1970-01-05T08:01:00+00:00")
                .unwrap()
                .with_timezone(&Utc)
        )
    );
}

#[test]
fn test_invalid_xes_file_gz_expected() {
    // Plain XML is not a gzip stream
    let x = include_bytes!("test_data/repair_small.xes");
    let res = import_xes_slice(x, true, XESImportOptions::default());
    assert!(matches!(res, Err(XESParseError::XMLParsingError(_))));
}

#[test]
fn test_invalid_xes_file_gz_unexpected() {
    let x = gzip(include_bytes!("test_data/repair_small.xes"));
    let res = import_xes_slice(&x, false, XESImportOptions::default());
    // Depending on the compressed bytes, the reader either fails on them or never finds a <log>
    assert!(matches!(
        res,
        Err(XESParseError::NoTopLevelLog | XESParseError::XMLParsingError(_))
    ));
}

#[test]
fn test_invalid_xes_file_zero() {
    let x = vec![0u8; 4096];
    let res = import_xes_slice(&x, false, XESImportOptions::default());
    assert!(matches!(res, Err(XESParseError::NoTopLevelLog)));
}

#[test]
fn test_invalid_xes_file_other_xml() {
    let xml = r#"<?xml version="1.0"?><pnml><net id="n"/></pnml>"#;
    let res = import_xes_str(xml, XESImportOptions::default());
    assert!(matches!(res, Err(XESParseError::NoTopLevelLog)));
}

#[test]
fn test_invalid_xes_malformed() {
    let res = import_xes_str(
        "<log><trace><event></trace></log>",
        XESImportOptions::default(),
    );
    assert!(matches!(res, Err(XESParseError::XMLParsingError(_))));
}

#[test]
fn test_attribute_after_log_closed() {
    let res = import_xes_str(
        r#"<log></log><string key="a" value="b"/>"#,
        XESImportOptions::default(),
    );
    assert!(matches!(res, Err(XESParseError::AttributeOutsideLog)));
}

#[test]
fn test_empty_log() {
    let log = import_xes_str("<log/>", XESImportOptions::default()).unwrap();
    assert!(log.traces.is_empty());
    assert_eq!(log.extensions, None);
    assert_eq!(log.classifiers, None);
    assert_eq!(log.global_event_attrs, None);
}
