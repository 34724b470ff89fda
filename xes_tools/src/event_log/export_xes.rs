use std::io::Write;

use quick_xml::{events::BytesDecl, Writer};

use super::{
    event_log_struct::{EventLogClassifier, EventLogExtension},
    Attribute, AttributeValue, Attributes, Trace,
};
use crate::{utils::xml_utils::XMLWriterWrapper, EventLog};

const OK: Result<(), std::io::Error> = Ok(());

///
/// Export XES (from log data and a slice of traces) to a XML writer
///
#[allow(clippy::too_many_arguments)]
fn export_xes<'a, W>(
    writer: impl Into<XMLWriterWrapper<'a, W>>,
    log_extensions: Option<&[EventLogExtension]>,
    log_global_trace_attrs: Option<&Attributes>,
    log_global_event_attrs: Option<&Attributes>,
    log_classifiers: Option<&[EventLogClassifier]>,
    log_attributes: &Attributes,
    traces: &[Trace],
) -> Result<(), quick_xml::Error>
where
    W: Write + 'a,
{
    let mut xml_writer = writer.into();
    let writer: &mut Writer<W> = xml_writer.to_xml_writer();
    writer.write_event(quick_xml::events::Event::Decl(BytesDecl::new(
        "1.0",
        Some("UTF-8"),
        None,
    )))?;
    writer
        .create_element("log")
        .with_attributes(vec![
            ("xes.version", "2.0"),
            // Nested attributes are not always present, but they might be
            ("xes.features", "nested-attributes"),
            ("xmlns", "http://www.xes-standard.org/"),
        ])
        .write_inner_content(|w| {
            for ext in log_extensions.unwrap_or_default() {
                w.create_element("extension")
                    .with_attributes(vec![
                        ("name", ext.name.as_str()),
                        ("prefix", ext.prefix.as_str()),
                        ("uri", ext.uri.as_str()),
                    ])
                    .write_empty()?;
            }
            for (scope, globals) in [
                ("trace", log_global_trace_attrs),
                ("event", log_global_event_attrs),
            ] {
                if let Some(globals) = globals {
                    w.create_element("global")
                        .with_attribute(("scope", scope))
                        .write_inner_content(|w| {
                            for a in globals {
                                write_xes_attribute(w, a)?;
                            }
                            OK
                        })?;
                }
            }
            for cl in log_classifiers.unwrap_or_default() {
                w.create_element("classifier")
                    .with_attributes(vec![
                        ("name", cl.name.as_str()),
                        ("keys", cl.serialize_keys().as_str()),
                    ])
                    .write_empty()?;
            }
            for a in log_attributes {
                write_xes_attribute(w, a)?;
            }
            for t in traces {
                w.create_element("trace").write_inner_content(|w| {
                    for a in &t.attributes {
                        write_xes_attribute(w, a)?;
                    }
                    for e in &t.events {
                        w.create_element("event").write_inner_content(|w| {
                            for a in &e.attributes {
                                write_xes_attribute(w, a)?;
                            }
                            OK
                        })?;
                    }
                    OK
                })?;
            }
            OK
        })?;
    Ok(())
}

fn write_xes_attribute<T>(w: &mut Writer<T>, a: &Attribute) -> Result<(), std::io::Error>
where
    T: Write,
{
    let tag_name = a.value.xes_type_name();
    let value_opt: Option<String> = match &a.value {
        AttributeValue::List(_) | AttributeValue::Container(_) | AttributeValue::None() => None,
        v => Some(v.to_string()),
    };
    let e = match &value_opt {
        Some(value) => w
            .create_element(tag_name)
            .with_attributes(vec![("key", a.key.as_str()), ("value", value.as_str())]),
        None => w
            .create_element(tag_name)
            .with_attribute(("key", a.key.as_str())),
    };
    let children: Option<&Attributes> = match &a.value {
        AttributeValue::List(c) | AttributeValue::Container(c) => Some(c),
        _ => a.own_attributes.as_ref(),
    };
    match children {
        Some(children) => {
            e.write_inner_content(|inner_w| {
                for child in children {
                    write_xes_attribute(inner_w, child)?;
                }
                OK
            })?;
        }
        None => {
            e.write_empty()?;
        }
    }
    OK
}

///
/// Export an [`EventLog`] to a writer
///
/// Both [`quick_xml::Writer`] as well as [`std::io::Write`] are accepted
///
pub fn export_xes_event_log<'a, W>(
    writer: impl Into<XMLWriterWrapper<'a, W>>,
    log: &EventLog,
) -> Result<(), quick_xml::Error>
where
    W: Write + 'a,
{
    export_xes(
        writer,
        log.extensions.as_deref(),
        log.global_trace_attrs.as_ref(),
        log.global_event_attrs.as_ref(),
        log.classifiers.as_deref(),
        &log.attributes,
        &log.traces,
    )
}

#[cfg(test)]
mod export_xes_tests {
    use std::io::BufWriter;

    use quick_xml::Writer;

    use crate::event_log::{
        export_xes::export_xes_event_log, import_xes::import_xes_slice,
        import_xes::XESImportOptions, AttributeValue, XESEditableAttribute,
    };

    #[test]
    fn test_xes_export_std_writer() {
        let x = include_bytes!("tests/test_data/repair_small.xes");
        let log = import_xes_slice(x, false, XESImportOptions::default()).unwrap();
        let mut buf_writer = BufWriter::new(Vec::new());
        export_xes_event_log(&mut buf_writer, &log).unwrap();
        let data = buf_writer.into_inner().unwrap();
        let log2 = import_xes_slice(&data, false, XESImportOptions::default()).unwrap();
        assert_eq!(log.traces.len(), log2.traces.len());
        // Order of traces, events, attributes, extensions, ... must be preserved exactly
        assert_eq!(log, log2);
    }

    #[test]
    fn test_xes_export_xml_writer() {
        let x = include_bytes!("tests/test_data/nested_attributes.xes");
        let log = import_xes_slice(x, false, XESImportOptions::default()).unwrap();
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        export_xes_event_log(&mut writer, &log).unwrap();
        let data = writer.into_inner();
        let log2 = import_xes_slice(&data, false, XESImportOptions::default()).unwrap();
        assert_eq!(log, log2);
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let x = include_bytes!("tests/test_data/repair_small.xes");
        let mut log = import_xes_slice(x, false, XESImportOptions::default()).unwrap();
        let name = "<Repair & \"Test\">";
        log.traces[0].events[0]
            .attributes
            .get_by_key_mut("concept:name")
            .unwrap()
            .value = AttributeValue::String(name.to_string());
        let mut data = Vec::new();
        export_xes_event_log(&mut data, &log).unwrap();
        let log2 = import_xes_slice(&data, false, XESImportOptions::default()).unwrap();
        assert_eq!(
            log2.traces[0].events[0]
                .attributes
                .get_by_key("concept:name")
                .and_then(|a| a.value.try_as_string())
                .map(String::as_str),
            Some(name)
        );
    }
}
