use std::io::Write;

use serde::{Deserialize, Serialize};

use recstore::{
    deploy, propagate, Error, HierarchyBuilder, HierarchySpec, LevelId, Payload, TypedResolver,
    Value,
};

const MACHINE: &str = r#"{
    "root": "Machine",
    "levels": [
        { "name": "Axis", "ids": ["x", "y"] },
        { "name": "Motor", "ids": [1, 2] }
    ]
}"#;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Limits {
    low: f64,
    high: f64,
}

fn machine() -> recstore::Hierarchy {
    let spec = HierarchySpec::from_json_str(MACHINE).unwrap();
    HierarchyBuilder::from(spec)
        .configure("Motor", |c| c.parameter("current", 1.5))
        .build()
        .unwrap()
}

#[test]
fn test_generated_tree_resolves_ids_and_defaults() {
    let h = machine();
    let m = h.instantiate();
    let motor = h
        .bridge(&m.child("y").unwrap(), "Motor", Some(&LevelId::from(2)))
        .unwrap();
    assert_eq!(motor.get("axis").unwrap(), Value::from("y"));
    assert_eq!(motor.get("motor").unwrap(), Value::from(2));
    assert_eq!(motor.get("current").unwrap(), Value::from(1.5));
}

#[test]
fn test_payload_file_propagates_through_the_tree() {
    let h = machine();
    let m = h.instantiate();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "site": "lab",
            ".x.motor1[current]": 2.5,
            ".y": {{ "limits": {{ "low": -1.0, "high": 1.0 }} }}
        }}"#
    )
    .unwrap();
    let payload = Payload::from_reader(std::fs::File::open(file.path()).unwrap()).unwrap();
    propagate(&m, payload).unwrap();

    let x1 = m.child("x").unwrap().child("motor1").unwrap();
    assert_eq!(x1.get("current").unwrap(), Value::from(2.5));
    assert_eq!(x1.get("site").unwrap(), Value::from("lab"));

    let x2 = m.child("x").unwrap().child("motor2").unwrap();
    assert_eq!(x2.get("current").unwrap(), Value::from(1.5));

    let y2 = h
        .bridge(&m.child("y").unwrap(), "Motor", Some(&LevelId::from(2)))
        .unwrap();
    let limits: Limits = y2.get_as("limits").unwrap();
    assert_eq!(limits, Limits { low: -1.0, high: 1.0 });
}

#[test]
fn test_deploy_round_trips_into_a_fresh_tree() {
    let h = machine();
    let source = h.instantiate();
    source.set("site", "lab").unwrap();
    source
        .child("x")
        .unwrap()
        .child("motor2")
        .unwrap()
        .set("current", 3.0)
        .unwrap();

    let json = deploy(&source).unwrap().to_json().unwrap();
    assert_eq!(json["site"], serde_json::json!("lab"));
    assert_eq!(json[".x"][".motor2"]["current"], serde_json::json!(3.0));

    let target = h.instantiate();
    propagate(&target, Payload::from_json(json).unwrap()).unwrap();
    let motor = target.child("x").unwrap().child("motor2").unwrap();
    assert_eq!(motor.get("current").unwrap(), Value::from(3.0));
    assert_eq!(motor.get("site").unwrap(), Value::from("lab"));
}

#[test]
fn test_bridge_from_the_root_needs_a_selector() {
    let h = machine();
    let m = h.instantiate();
    let err = h
        .bridge(&m, "Motor", Some(&LevelId::from(1)))
        .unwrap_err();
    assert!(err.is_key_not_found());

    m.set("axis", "x").unwrap();
    let motor = h.bridge(&m, "Motor", Some(&LevelId::from(1))).unwrap();
    // the instance id shadows the selector written on the root
    assert_eq!(motor.get("axis").unwrap(), Value::from("x"));

    let err = h.bridge(&m, "Motor", Some(&LevelId::from(3))).unwrap_err();
    assert!(matches!(err, Error::NoAttribute { .. }));
}
