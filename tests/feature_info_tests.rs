use berney::feature_info::{DisplayRow, FeatureProperties, inspect};
use serde_json::json;

fn properties(pairs: &[(&str, serde_json::Value)]) -> FeatureProperties {
  pairs
    .iter()
    .map(|(k, v)| ((*k).to_string(), v.clone()))
    .collect()
}

#[test]
fn parcel_with_two_known_attributes_yields_two_rows() {
  let rows = inspect(&properties(&[
    ("own_name", json!("Dupont")),
    ("area", json!(250)),
  ]));

  assert_eq!(
    rows,
    vec![
      DisplayRow {
        label: "Nom propriétaire",
        value: "Dupont".to_string(),
      },
      DisplayRow {
        label: "Surface",
        value: "250 m²".to_string(),
      },
    ]
  );
}

#[test]
fn area_values_keep_their_decimals() {
  let rows = inspect(&properties(&[("area", json!(123.45))]));
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].value, "123.45 m²");
}

#[test]
fn almanac_entry_yields_all_nine_rows() {
  let rows = inspect(&properties(&[
    ("field_1", json!("7")),
    ("nom", json!("Rossier")),
  ]));

  assert_eq!(rows.len(), 9);
  assert!(rows.contains(&DisplayRow {
    label: "Nom",
    value: "Rossier".to_string(),
  }));
  // Absent keys still produce rows with empty values on the almanac side.
  assert!(rows.contains(&DisplayRow {
    label: "Métier",
    value: String::new(),
  }));
}

#[test]
fn parcels_win_over_almanac_entries_when_both_keys_are_present() {
  let rows = inspect(&properties(&[
    ("area", json!(100)),
    ("field_1", json!("7")),
    ("nom", json!("Rossier")),
  ]));

  // `nom` is an almanac attribute; a property set with an `area` key is
  // described as a parcel, so it must not show up.
  assert!(rows.iter().all(|row| row.label != "Nom"));
  assert!(rows.iter().any(|row| row.label == "Surface"));
}

#[test]
fn unknown_property_shapes_yield_nothing() {
  assert!(inspect(&properties(&[("highway", json!("residential"))])).is_empty());
  assert!(inspect(&FeatureProperties::new()).is_empty());
}

// The two classes treat empty values differently: the cadastre side skips
// such rows, the almanac side emits them. This mirrors the long-standing
// presentation of the two registers and is covered here so any change to
// it is deliberate.
#[test]
fn empty_value_handling_differs_between_the_two_classes() {
  let cadastre_rows = inspect(&properties(&[
    ("area", json!(250)),
    ("own_name", json!("")),
  ]));
  assert_eq!(cadastre_rows.len(), 1);
  assert_eq!(cadastre_rows[0].label, "Surface");

  let almanac_rows = inspect(&properties(&[("field_1", json!("7")), ("nom", json!(""))]));
  assert_eq!(almanac_rows.len(), 9);
}
