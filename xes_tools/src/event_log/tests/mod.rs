use crate::{
    diagnostics::{Diagnostic, DiagnosticLevel},
    event_log::{
        import_xes::{
            build_ignore_attributes, import_xes_slice, import_xes_str, import_xes_with_sink,
            XESImportOptions, XESParseError,
        },
        AttributeValue, XESEditableAttribute,
    },
    normalize::canonical_trace_string,
};

mod xes_import_tests;

#[test]
fn test_event_log_attribute_helpers() {
    let x = include_bytes!("./test_data/repair_small.xes");
    let mut log = import_xes_slice(x, false, XESImportOptions::default()).unwrap();
    // Global trace attribute for "concept:name" is set to "__INVALID__"
    let trace = log.traces.last_mut().unwrap();
    let concept_name = trace
        .attributes
        .get_by_key_or_global("concept:name", &log.global_trace_attrs)
        .and_then(|a| a.value.try_as_string())
        .unwrap();
    assert_eq!(concept_name, "100");
    // ...but if we remove this attribute...
    trace.attributes.remove_with_key("concept:name");
    // ...the global attribute value ("__INVALID__") will be returned
    let concept_name_after = trace
        .attributes
        .get_by_key_or_global("concept:name", &log.global_trace_attrs)
        .and_then(|a| a.value.try_as_string())
        .unwrap();
    assert_eq!(concept_name_after, "__INVALID__");
    // Strict accessors do not fall back to globals
    assert!(trace.id().is_err());
}

#[test]
fn test_repair_small_content() {
    let x = include_bytes!("./test_data/repair_small.xes");
    let log = import_xes_slice(x, false, XESImportOptions::default()).unwrap();
    assert_eq!(log.num_events(), 10);
    assert_eq!(log.traces[1].id().unwrap(), "10");
    assert_eq!(
        canonical_trace_string(&log.traces[1]).unwrap(),
        "$Register$Analyze Defect$Analyze Defect"
    );
    let activity = log.get_classifier_by_name("Activity").unwrap();
    assert_eq!(
        activity.keys,
        vec!["concept:name".to_string(), "lifecycle:transition".to_string()]
    );
    assert_eq!(
        activity.get_class_identity(&log.traces[0].events[1]),
        "Analyze Defect+start"
    );
    let log_name = log
        .attributes
        .get_by_key("concept:name")
        .and_then(|a| a.value.try_as_string());
    assert_eq!(log_name.map(String::as_str), Some("Repair Example (small)"));
    assert_eq!(log.global_event_attrs.as_ref().map(Vec::len), Some(3));
}

#[test]
fn test_nested_attributes() {
    let x = include_bytes!("./test_data/nested_attributes.xes");
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let log = import_xes_with_sink(&x[..], XESImportOptions::default(), &mut diagnostics).unwrap();
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let trace = &log.traces[0];
    let customer = trace.attributes.get_by_key("customer").unwrap();
    match &customer.value {
        AttributeValue::Container(children) => {
            assert_eq!(children.len(), 2);
            assert_eq!(
                children.get_by_key("name").and_then(|a| a.value.try_as_string()),
                Some(&"Jane & Co.".to_string())
            );
        }
        v => panic!("expected container, got {v:?}"),
    }

    let items = trace.events[0].attributes.get_by_key("items").unwrap();
    match &items.value {
        AttributeValue::List(children) => {
            // The <values> wrapper is not an attribute itself
            assert_eq!(children.len(), 2);
            let mouse = &children[1];
            assert_eq!(mouse.value, AttributeValue::String("Mouse".to_string()));
            let own = mouse.own_attributes.as_ref().unwrap();
            assert_eq!(own[0].value, AttributeValue::Int(2));
        }
        v => panic!("expected list, got {v:?}"),
    }
    assert!(matches!(
        trace.events[0].attributes.get_by_key("identity:id").unwrap().value,
        AttributeValue::ID(_)
    ));

    let weight = trace.events[1].attributes.get_by_key("weight").unwrap();
    assert_eq!(weight.value, AttributeValue::Float(1.75));
    assert_eq!(weight.own_attributes.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_ignore_attributes() {
    let x = include_bytes!("./test_data/repair_small.xes");
    let options = XESImportOptions {
        ignore_event_attributes_except: Some(build_ignore_attributes(["concept:name"])),
        ignore_trace_attributes_except: Some(build_ignore_attributes(Vec::<&str>::new())),
        ..Default::default()
    };
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let log = import_xes_with_sink(&x[..], options, &mut diagnostics).unwrap();
    assert!(log.traces.iter().all(|t| t.attributes.is_empty()));
    assert!(log
        .traces
        .iter()
        .flat_map(|t| &t.events)
        .all(|e| e.attributes.len() == 1 && e.name().is_ok()));
    // Globals are not affected
    assert_eq!(log.global_event_attrs.as_ref().map(Vec::len), Some(3));
    // 3 trace names and 25 non-name event attributes are summarized in a single message
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, DiagnosticLevel::Info);
    assert!(diagnostics[0].message.contains("Ignored 28 attributes"));
}

#[test]
fn test_custom_date_format() {
    let xes = r#"<log><trace><event>
        <string key="concept:name" value="A"/>
        <date key="time:timestamp" value="24.12.2021 18:30"/>
    </event></trace></log>"#;
    let log = import_xes_str(
        xes,
        XESImportOptions {
            date_format: Some("%d.%m.%Y %H:%M".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(
        log.traces[0].events[0].timestamp().unwrap().to_rfc3339(),
        "2021-12-24T18:30:00+00:00"
    );
}

#[test]
fn test_invalid_global_scope() {
    let xes = r#"<log><global scope="case"><string key="a" value="b"/></global></log>"#;
    assert!(matches!(
        import_xes_str(xes, XESImportOptions::default()),
        Err(XESParseError::InvalidKeyValue("scope"))
    ));
}
