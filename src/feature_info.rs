//! Turns the raw property set of a clicked feature into the ordered,
//! bilingual attribute rows shown in the detail panel.

use std::collections::HashMap;

use serde_json::Value;

/// Attribute labels and value formatting per feature class.
pub mod dictionary;

use dictionary::Lang;

/// The raw property set of one feature as delivered by the layer that was
/// hit. Ephemeral; only read during a single inspection.
pub type FeatureProperties = HashMap<String, Value>;

/// The two feature classes this viewer knows how to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureClass {
  Cadastre,
  Almanac,
}

/// One row of the detail panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
  pub label: &'static str,
  pub value: String,
}

/// Tells the two feature classes apart by their distinguishing property:
/// parcels carry `area`, almanac entries carry `field_1`. Anything else is
/// not ours to describe.
#[must_use]
pub fn classify(properties: &FeatureProperties) -> Option<FeatureClass> {
  if properties.contains_key("area") {
    Some(FeatureClass::Cadastre)
  } else if properties.contains_key("field_1") {
    Some(FeatureClass::Almanac)
  } else {
    None
  }
}

/// Builds the display rows for a clicked feature, in dictionary order with
/// French labels. Returns an empty sequence for unrecognized property
/// shapes; the caller hides the panel in that case.
///
/// Cadastre rows with an empty formatted value are skipped. Almanac rows
/// are always emitted, even when empty. The asymmetry is deliberate: it
/// mirrors how the two registers have historically been presented.
#[must_use]
pub fn inspect(properties: &FeatureProperties) -> Vec<DisplayRow> {
  let Some(class) = classify(properties) else {
    return Vec::new();
  };

  dictionary::describe(class)
    .iter()
    .filter_map(|descriptor| {
      let value = descriptor.format.apply(properties.get(descriptor.key));
      if class == FeatureClass::Cadastre && value.is_empty() {
        return None;
      }
      Some(DisplayRow {
        label: descriptor.label(Lang::Fr),
        value,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use rstest::rstest;
  use serde_json::json;

  use super::*;

  fn properties(pairs: &[(&str, Value)]) -> FeatureProperties {
    pairs
      .iter()
      .map(|(k, v)| ((*k).to_string(), v.clone()))
      .collect()
  }

  #[rstest]
  #[case(&[("area", json!(250))], Some(FeatureClass::Cadastre))]
  #[case(&[("field_1", json!("7"))], Some(FeatureClass::Almanac))]
  #[case(&[("area", json!(250)), ("field_1", json!("7"))], Some(FeatureClass::Cadastre))]
  #[case(&[("nom", json!("Rossier"))], None)]
  #[case(&[], None)]
  fn classification(#[case] pairs: &[(&str, Value)], #[case] expected: Option<FeatureClass>) {
    assert_eq!(classify(&properties(pairs)), expected);
  }

  #[test]
  fn cadastre_rows_keep_dictionary_order_and_skip_empty() {
    let props = properties(&[
      ("own_name", json!("Dupont")),
      ("area", json!(250)),
      ("page", json!("")),
    ]);

    let rows = inspect(&props);
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
  fn almanac_always_emits_all_nine_rows() {
    // The almanac side never skips empty rows while the cadastre side
    // does. That asymmetry is preserved on purpose; see inspect().
    let props = properties(&[("field_1", json!("7")), ("nom", json!("Rossier"))]);

    let rows = inspect(&props);
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[0].label, "Nom");
    assert_eq!(rows[0].value, "Rossier");
    assert_eq!(rows[1].label, "Métier");
    assert_eq!(rows[1].value, "");
  }

  #[test]
  fn unrecognized_shapes_yield_no_rows() {
    let props = properties(&[("name", json!("anything"))]);
    assert!(inspect(&props).is_empty());
    assert!(inspect(&FeatureProperties::new()).is_empty());
  }

  #[test]
  fn missing_values_degrade_to_empty_strings() {
    let props = properties(&[("field_1", json!(null))]);
    let rows = inspect(&props);
    assert_eq!(rows.len(), 9);
    assert!(rows.iter().all(|row| row.value.is_empty()));
  }
}
