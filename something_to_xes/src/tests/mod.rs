use std::{fs::File, io::BufReader, io::Read};

use flate2::bufread::GzDecoder;

use crate::{
    convert_path, convert_reader,
    record::{CSVSourceOptions, ElementSelector},
    typing::TypedValue,
    utils::test_utils::get_test_data_path,
    xes::{XESDocument, XESTrace},
    ConversionError, ConversionOptions, InputFormat,
};

fn hospital_options() -> ConversionOptions {
    ConversionOptions::from_json_path(get_test_data_path().join("config").join("hospital.json"))
        .unwrap()
}

fn convert_hospital_csv(options: ConversionOptions) -> XESDocument {
    let path = get_test_data_path().join("csv").join("hospital.csv");
    convert_reader(
        BufReader::new(File::open(path).unwrap()),
        InputFormat::CSV(CSVSourceOptions::default()),
        options,
    )
    .unwrap()
}

fn xml_options() -> ConversionOptions {
    ConversionOptions::default()
        .with_trace_key("%(case)s")
        .with_event_mapping("concept:name", "%(activity)s")
        .with_event_mapping("time:timestamp", "%(timestamp)s")
        .with_event_mapping("org:group", "%(patient.ward)s")
}

fn convert_hospital_xml(
    selector: ElementSelector,
    options: ConversionOptions,
) -> Result<XESDocument, ConversionError> {
    let path = get_test_data_path().join("xml").join("hospital.xml");
    convert_reader(
        BufReader::new(File::open(path).unwrap()),
        InputFormat::XML(selector),
        options,
    )
}

fn value<'a>(attrs: impl IntoIterator<Item = &'a crate::xes::TypedAttribute>, key: &str) -> Option<String> {
    attrs
        .into_iter()
        .find(|a| a.key == key)
        .map(|a| a.value.to_string())
}

fn trace_keys(document: &XESDocument) -> Vec<String> {
    document.traces.iter().filter_map(XESTrace::key).collect()
}

#[test]
fn test_csv_end_to_end() {
    let document = convert_hospital_csv(hospital_options());
    assert_eq!(trace_keys(&document), vec!["A-1", "A-2", "A-3", ""]);
    assert_eq!(document.num_events(), 7);

    let prefixes: Vec<&str> = document
        .extensions
        .iter()
        .map(|e| e.prefix.as_str())
        .collect();
    assert_eq!(prefixes, vec!["concept", "time", "org", "cost", "hospital"]);

    let a1 = &document.traces[0];
    let activities: Vec<_> = a1
        .events
        .iter()
        .filter_map(|e| value(&e.attributes, "concept:name"))
        .collect();
    assert_eq!(activities, vec!["Registration", "Triage", "X-Ray"]);

    let registration = &a1.events[0];
    assert_eq!(
        value(&registration.attributes, "time:timestamp").as_deref(),
        Some("2023-03-01T08:15:00.000Z")
    );
    assert_eq!(
        registration.get("cost:total").map(|a| &a.value),
        Some(&TypedValue::Float(12.5))
    );
    assert_eq!(
        registration.get("hospital:urgent").map(|a| &a.value),
        Some(&TypedValue::Boolean(true))
    );

    let triage = &a1.events[1];
    assert_eq!(
        value(&triage.attributes, "time:timestamp").as_deref(),
        Some("2023-03-01T08:40:00.000+01:00")
    );
    // "n/a" is not a float
    assert!(triage.get("cost:total").is_none());

    let x_ray = &a1.events[2];
    assert_eq!(
        value(&x_ray.attributes, "time:timestamp").as_deref(),
        Some("2023-03-01T09:05:00.000Z")
    );
    assert_eq!(
        x_ray.get("hospital:urgent").map(|a| &a.value),
        Some(&TypedValue::Boolean(true))
    );

    // Event attributes follow rule declaration order
    let keys: Vec<&str> = registration.attributes.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "concept:name",
            "time:timestamp",
            "org:group",
            "cost:total",
            "hospital:urgent"
        ]
    );

    // Records without a case end up in the trace with the empty key
    let unrouted = &document.traces[3];
    assert_eq!(unrouted.events.len(), 1);
    assert!(unrouted.get("patient").is_none());
}

#[test]
fn test_csv_trace_attributes_are_pseudonymized() {
    let document = convert_hospital_csv(hospital_options());
    let patients: Vec<String> = document.traces[..3]
        .iter()
        .map(|t| value(&t.attributes, "patient").unwrap())
        .collect();
    for raw in ["Jens Baggesen", "Karen Blixen", "Hans Christian Andersen"] {
        assert!(!patients.iter().any(|p| p == raw));
    }
    assert_ne!(patients[0], patients[1]);
    assert_ne!(patients[1], patients[2]);
    // concept:name comes first, then the other trace attributes
    assert_eq!(document.traces[0].attributes[0].key, "concept:name");
    assert_eq!(document.traces[0].attributes[1].key, "patient");
}

#[test]
fn test_conversion_is_deterministic() {
    let first = convert_hospital_csv(hospital_options());
    let second = convert_hospital_csv(hospital_options());
    assert_eq!(first, second);

    let mut other_seed = hospital_options();
    other_seed.pseudonym_seed += 1;
    let third = convert_hospital_csv(other_seed);
    assert_eq!(trace_keys(&first), trace_keys(&third));
    assert_ne!(
        value(&first.traces[0].attributes, "patient"),
        value(&third.traces[0].attributes, "patient")
    );
}

#[test]
fn test_max_traces() {
    let mut options = hospital_options();
    options.max_traces = Some(2);
    let document = convert_hospital_csv(options);
    assert_eq!(trace_keys(&document), vec!["A-1", "A-2"]);
    assert_eq!(document.num_events(), 5);
}

#[test]
fn test_preserve_mode() {
    let mut options = hospital_options();
    options.preserve = true;
    let document = convert_hospital_csv(options);
    let discharge = &document.traces[1].events[1];
    let keys: Vec<&str> = discharge.attributes.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "concept:name",
            "time:timestamp",
            "org:group",
            "cost:total",
            "case",
            "activity",
            "timestamp",
            "patient",
            "department",
            "cost"
        ]
    );
    // Preserved values are untyped and already pseudonymized
    assert_eq!(
        discharge.get("cost").map(|a| &a.value),
        Some(&TypedValue::String("0".to_string()))
    );
    assert_ne!(value(&discharge.attributes, "patient").as_deref(), Some("Karen Blixen"));
}

#[test]
fn test_xml_end_to_end() {
    let document =
        convert_hospital_xml(ElementSelector::css("entry").unwrap(), xml_options()).unwrap();
    assert_eq!(trace_keys(&document), vec!["A-1", "A-2"]);
    assert_eq!(document.num_events(), 4);
    let triage = &document.traces[0].events[1];
    assert_eq!(
        value(&triage.attributes, "concept:name").as_deref(),
        Some("Triage & Assessment")
    );
    assert_eq!(value(&triage.attributes, "org:group").as_deref(), Some("ER"));
    assert_eq!(
        value(&document.traces[1].events[1].attributes, "org:group").as_deref(),
        Some("Home")
    );

    // Only the entries of the day element
    let day_only = convert_hospital_xml(
        ElementSelector::xpath("/export/day/entry").unwrap(),
        xml_options(),
    )
    .unwrap();
    assert_eq!(day_only.num_events(), 3);
}

#[test]
fn test_xml_trace_attribute_conflict() {
    let options = xml_options().with_trace_mapping("ward", "%(patient.ward)s");
    let res = convert_hospital_xml(ElementSelector::xpath("//entry").unwrap(), options);
    match res {
        Err(ConversionError::TraceAttributeConflict {
            trace,
            attribute,
            first,
            second,
        }) => {
            assert_eq!(trace, "A-2");
            assert_eq!(attribute.to_string(), "ward");
            assert_eq!((first.as_str(), second.as_str()), ("ER", "Home"));
        }
        other => panic!("expected a trace attribute conflict, got {other:?}"),
    }
}

#[test]
fn test_configuration_errors() {
    let unknown_prefix = xml_options().with_event_mapping("hospital:urgent", "%(urgent)s");
    assert!(matches!(
        convert_hospital_xml(ElementSelector::css("entry").unwrap(), unknown_prefix),
        Err(ConversionError::UnknownExtension(_))
    ));

    let bad_template = xml_options().with_event_mapping("note", "100%");
    assert!(matches!(
        convert_hospital_xml(ElementSelector::css("entry").unwrap(), bad_template),
        Err(ConversionError::InvalidTemplate { .. })
    ));
}

#[test]
fn test_gz_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("hospital.xes.gz");
    let input = get_test_data_path().join("csv").join("hospital.csv");
    let document = convert_path(
        Some(input.as_path()),
        Some(out.as_path()),
        InputFormat::CSV(CSVSourceOptions::default()),
        hospital_options(),
    )
    .unwrap();
    assert_eq!(document.traces.len(), 4);

    let mut xes = String::new();
    GzDecoder::new(BufReader::new(File::open(&out).unwrap()))
        .read_to_string(&mut xes)
        .unwrap();
    assert!(xes.starts_with("<?xml"));
    assert!(xes.contains(r#"<extension name="Hospital" prefix="hospital" uri="http://example.org/hospital.xesext"/>"#));
    assert_eq!(xes.matches("<trace>").count(), 4);
    assert_eq!(xes.matches("<event>").count(), 7);

    // Compressed input is detected by its content
    let csv_gz = dir.path().join("hospital-csv-data");
    let mut encoder = flate2::write::GzEncoder::new(
        File::create(&csv_gz).unwrap(),
        flate2::Compression::fast(),
    );
    std::io::copy(&mut File::open(&input).unwrap(), &mut encoder).unwrap();
    encoder.finish().unwrap();
    let plain_out = dir.path().join("hospital.xes");
    let from_gz = convert_path(
        Some(csv_gz.as_path()),
        Some(plain_out.as_path()),
        InputFormat::CSV(CSVSourceOptions::default()),
        hospital_options(),
    )
    .unwrap();
    assert_eq!(from_gz, document);
    let plain = std::fs::read_to_string(&plain_out).unwrap();
    assert_eq!(plain, xes);
}
