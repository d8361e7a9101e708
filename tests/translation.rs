use nxinstr_engine::diagnostics::DiagnosticKind;
use nxinstr_engine::graph::{TargetNode, Value};
use nxinstr_engine::instrument::{ExportOptions, ReferenceSelection, StructuralPolicy, export};
use nxinstr_engine::{Engine, ExportError, load_instrument};

const GUIDE_LINE: &str = r#"{
    "name": "guide_line",
    "parameters": [{"name": "E", "default": 5}],
    "declare": {"L0": 1.930338},
    "components": [
        {"name": "origin", "type": "Progress_bar"},
        {"name": "guide_start", "type": "Arm",
         "at": {"vector": [0.01277, 0, "L0"], "relative": "origin"},
         "rotated": {"vector": [0, -0.56, 0], "relative": "origin"}},
        {"name": "guide", "type": "Guide_gravity",
         "parameters": {"l": 1, "w1": 0.05, "h1": 0.05, "m": 2},
         "at": {"vector": [0, 0, 0], "relative": "guide_start"}},
        {"name": "guide_end", "type": "Arm",
         "at": {"vector": [0, 0, 4.33], "relative": "guide"}},
        {"name": "chopper", "type": "DiskChopper",
         "parameters": {"nslit": 2, "theta_0": 20, "radius": 0.35, "nu": "14*E"},
         "at": {"vector": [0, 0, 1.5], "relative": "guide"}},
        {"name": "sample", "type": "Incoherent", "category": "samples",
         "at": {"vector": [0, 0, 2], "relative": "chopper"},
         "metadata": {"shape": {"type": "NXfield", "value": "cylinder"}}},
        {"name": "monitor", "type": "Monitor_nD", "category": "monitors",
         "at": {"vector": [0, 0, 0.5], "relative": "sample"},
         "metadata": {"filename": {"type": "NXfield", "value": "events.dat"}}}
    ]
}"#;

fn assert_close(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() < tol, "{a} != {b}");
}

fn transformation<'a>(tree: &'a TargetNode, component: &str, name: &str) -> &'a nxinstr_engine::graph::Field {
    tree.group(component)
        .and_then(|node| node.group("transformations"))
        .and_then(|group| group.field(name))
        .unwrap_or_else(|| panic!("missing {component}/transformations/{name}"))
}

#[test]
fn rotated_guide_start_exports_translation_then_rotation() {
    let instrument = load_instrument(GUIDE_LINE).unwrap();
    let options = ExportOptions {
        reference: ReferenceSelection::Absolute,
        ..ExportOptions::default()
    };
    let export = export(&instrument, &options).unwrap();

    let translation = transformation(&export.tree, "guide", "guide_0_t");
    assert_close(translation.value.expect_number().unwrap(), 1.930_380, 1e-6);
    assert_eq!(translation.depends_on(), Some("."));
    assert_eq!(
        translation.attribute("transformation_type"),
        Some(&Value::Text("translation".into()))
    );
    let direction = translation.attribute("vector").unwrap().expect_vector().unwrap();
    assert_close(direction[0], 0.006_615_3, 1e-6);
    assert_close(direction[1], 0.0, 1e-12);
    assert_close(direction[2], 0.999_978, 1e-6);

    let rotation = transformation(&export.tree, "guide", "guide_0_r");
    assert_eq!(rotation.value, Value::Number(-0.56));
    assert_eq!(rotation.depends_on(), Some("guide_0_t"));
    assert_eq!(rotation.attribute("vector"), Some(&Value::Vector([0.0, 1.0, 0.0])));
    assert_eq!(rotation.attribute("units"), Some(&Value::Text("degrees".into())));

    let guide = export.tree.group("guide").unwrap();
    assert_eq!(guide.class(), "NXguide");
    assert_eq!(guide.depends_on(), Some("transformations/guide_0_r"));
    assert!(guide.group("geometry").is_some());

    // The offset along the rotated guide axis stays after the rotation.
    let end = transformation(&export.tree, "guide_end", "guide_end_1");
    assert_close(end.value.expect_number().unwrap(), 4.33, 1e-12);
    assert_eq!(end.depends_on(), Some("guide_end_0_r"));
    assert_eq!(end.attribute("vector"), Some(&Value::Vector([0.0, 0.0, 1.0])));
    assert_eq!(
        export.tree.group("guide_end").unwrap().depends_on(),
        Some("transformations/guide_end_1")
    );

    let origin = export.tree.group("origin").unwrap();
    assert_eq!(origin.class(), "NXnote");
    assert!(origin.depends_on().is_none());
    assert!(!origin.contains("transformations"));
}

#[test]
fn sample_becomes_the_origin() {
    let instrument = load_instrument(GUIDE_LINE).unwrap();
    let export = export(&instrument, &ExportOptions::default()).unwrap();
    assert_eq!(export.reference.as_deref(), Some("sample"));

    let sample = export.tree.group("sample").unwrap();
    assert_eq!(sample.class(), "NXsample");
    assert!(sample.depends_on().is_none());
    // Without a chain a fragment keeps no dependency either.
    assert!(sample.field("shape").unwrap().depends_on().is_none());

    let monitor = export.tree.group("monitor").unwrap();
    assert_eq!(monitor.class(), "NXdetector");
    let step = transformation(&export.tree, "monitor", "monitor_0");
    assert_close(step.value.expect_number().unwrap(), 0.5, 1e-12);
    assert_eq!(
        monitor.field("filename").unwrap().depends_on(),
        Some("transformations/monitor_0")
    );
}

#[test]
fn chopper_fields_follow_the_nexus_names() {
    let instrument = load_instrument(GUIDE_LINE).unwrap();
    let export = export(&instrument, &ExportOptions::default()).unwrap();
    let chopper = export.tree.group("chopper").unwrap();
    assert_eq!(chopper.class(), "NXdisk_chopper");
    assert_eq!(chopper.field("slits").unwrap().value, Value::Number(2.0));
    assert_eq!(chopper.field("slit_height").unwrap().value, Value::Number(0.35));
    assert_eq!(
        chopper.field("slit_edges").unwrap().value,
        Value::Numbers(vec![-10.0, 10.0, 170.0, 190.0])
    );

    let speed = chopper.field("rotation_speed").unwrap();
    let deferred = speed.value.expect_deferred().unwrap();
    assert_eq!(deferred.links[0].target, "/entry/instrument/parameters/E");
    assert!(
        export
            .diagnostics
            .of_kind(DiagnosticKind::DeferredBinding)
            .any(|diagnostic| diagnostic.component.as_deref() == Some("chopper"))
    );
}

#[test]
fn metadata_can_extend_the_chain() {
    let text = r#"{
        "name": "extended",
        "components": [
            {"name": "detector", "type": "Monitor_nD", "category": "monitors",
             "at": [0, 0, 3],
             "metadata": {
                "transformations": {"type": "NXtransformations", "value": {
                    "tilt": {"type": "NXfield", "value": 5.0, "attributes": {
                        "depends_on": "detector_0", "transformation_type": "rotation",
                        "vector": [1, 0, 0], "units": "degrees"}}
                }},
                "pixel": {"type": "NXfield", "value": 0.01}
             }}
        ]
    }"#;
    let instrument = load_instrument(text).unwrap();
    let export = export(&instrument, &ExportOptions::default()).unwrap();
    assert!(export.diagnostics.has(DiagnosticKind::NotCentered));

    let detector = export.tree.group("detector").unwrap();
    assert_eq!(detector.depends_on(), Some("transformations/tilt"));
    assert_eq!(
        detector.field("pixel").unwrap().depends_on(),
        Some("transformations/tilt")
    );
    let placement = export.placement("detector").unwrap();
    assert_eq!(placement.outer.as_deref(), Some("tilt"));
    assert!(placement.chain.is_none());
}

#[test]
fn rejected_fragments_are_reported() {
    let text = r#"{
        "name": "fragments",
        "components": [
            {"name": "slit", "type": "Slit", "parameters": {"xwidth": 0.01, "yheight": 0.02},
             "metadata": {
                "notes": {"type": "dict", "value": {"who": "me"}},
                "bad name": {"type": "NXfield", "value": 1}
             }}
        ]
    }"#;
    let instrument = load_instrument(text).unwrap();
    let export = export(&instrument, &ExportOptions::default()).unwrap();
    let slit = export.tree.group("slit").unwrap();
    assert!(!slit.contains("notes"));
    assert!(!slit.contains("bad name"));
    assert_eq!(export.diagnostics.of_kind(DiagnosticKind::InvalidFragment).count(), 2);

    let lenient = ExportOptions {
        only_nx: false,
        ..ExportOptions::default()
    };
    let export = nxinstr_engine::export(&instrument, &lenient).unwrap();
    let slit = export.tree.group("slit").unwrap();
    assert!(slit.contains("notes"));
    assert_eq!(export.diagnostics.of_kind(DiagnosticKind::InvalidFragment).count(), 1);
}

#[test]
fn broken_chain_aborts_or_skips() {
    let text = r#"{
        "name": "broken",
        "components": [
            {"name": "sample", "type": "Incoherent", "category": "samples"},
            {"name": "detector", "type": "Monitor_nD", "at": [0, 0, 1],
             "metadata": {"transformations": {"type": "NXtransformations", "value": {
                "loop_a": {"type": "NXfield", "value": 1.0, "attributes": {"depends_on": "loop_b"}},
                "loop_b": {"type": "NXfield", "value": 1.0, "attributes": {"depends_on": "loop_a"}}
             }}}}
        ]
    }"#;
    let instrument = load_instrument(text).unwrap();
    let aborted = export(&instrument, &ExportOptions::default()).unwrap_err();
    assert!(matches!(aborted, ExportError::Structural { ref component, .. } if component == "detector"));

    let options = ExportOptions {
        structural_policy: StructuralPolicy::Skip,
        ..ExportOptions::default()
    };
    let skipped = export(&instrument, &options).unwrap();
    assert!(skipped.tree.contains("sample"));
    assert!(!skipped.tree.contains("detector"));
    assert!(skipped.diagnostics.has(DiagnosticKind::SkippedComponent));
}

#[test]
fn engine_round_trip_produces_json() {
    let mut engine = Engine::new();
    engine.load_instrument(GUIDE_LINE).unwrap();
    let json = engine.export_json().unwrap();
    let tree: serde_json::Value = serde_json::from_str(&json).unwrap();
    let names: Vec<&str> = tree["children"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        names,
        vec![
            "name",
            "mcstas",
            "origin",
            "guide_start",
            "guide",
            "guide_end",
            "chopper",
            "sample",
            "monitor"
        ]
    );
    assert_eq!(
        tree["children"]["monitor"]["attributes"]["depends_on"],
        "transformations/monitor_0"
    );
}
