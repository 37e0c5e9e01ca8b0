use serde_json::Value;

use super::FeatureClass;

/// A display language for attribute labels. French is the primary language
/// of the source registers; English is carried for every attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
  Fr,
  En,
}

/// How a raw property value is turned into display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
  /// The raw value, stringified; empty string when absent.
  Verbatim,
  /// The raw value with a ` m²` unit suffix; empty string when absent.
  AreaSquareMetres,
}

impl ValueFormat {
  #[must_use]
  pub fn apply(self, raw: Option<&Value>) -> String {
    let text = raw.map(stringify).unwrap_or_default();
    match self {
      ValueFormat::Verbatim => text,
      ValueFormat::AreaSquareMetres => {
        if text.is_empty() {
          text
        } else {
          format!("{text} m²")
        }
      }
    }
  }
}

fn stringify(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    other => other.to_string(),
  }
}

/// One attribute of a feature class: the raw property key, its bilingual
/// labels and its value formatting rule.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDescriptor {
  pub key: &'static str,
  labels: [(Lang, &'static str); 2],
  pub format: ValueFormat,
}

impl AttributeDescriptor {
  const fn new(key: &'static str, fr: &'static str, en: &'static str) -> Self {
    Self {
      key,
      labels: [(Lang::Fr, fr), (Lang::En, en)],
      format: ValueFormat::Verbatim,
    }
  }

  const fn with_format(mut self, format: ValueFormat) -> Self {
    self.format = format;
    self
  }

  #[must_use]
  pub fn label(&self, lang: Lang) -> &'static str {
    self
      .labels
      .iter()
      .find(|(l, _)| *l == lang)
      .map_or("", |(_, text)| text)
  }
}

/// The property attributes of a Berney cadastre parcel, in display order.
static CADASTRE: [AttributeDescriptor; 17] = [
  AttributeDescriptor::new("own_name", "Nom propriétaire", "Owner Name"),
  AttributeDescriptor::new("own_surnam", "Prénom propriétaire", "Owner Surname"),
  AttributeDescriptor::new("own_compl", "Complément propriétaire", "Owner Complement"),
  AttributeDescriptor::new("own_desc", "Description propriétaire", "Owner Description"),
  AttributeDescriptor::new("own_share", "Part propriétaire", "Owner Share"),
  AttributeDescriptor::new("own_type", "Type propriétaire", "Owner Type"),
  AttributeDescriptor::new("own_col_de", "Propriétaires (décompte)", "Owners (count)"),
  AttributeDescriptor::new("own_col_ty", "Propriétaires (type)", "Owners (type)"),
  AttributeDescriptor::new("main_use", "Utilisation principale", "Main Use"),
  AttributeDescriptor::new("use", "Utilisation", "Use"),
  AttributeDescriptor::new("category", "Catégorie", "Category"),
  AttributeDescriptor::new("class", "Classe", "Class"),
  AttributeDescriptor::new("subclass", "Sous-classe", "Subclass"),
  AttributeDescriptor::new("area", "Surface", "Area").with_format(ValueFormat::AreaSquareMetres),
  AttributeDescriptor::new("page", "Page", "Page"),
  AttributeDescriptor::new("number", "Numéro", "Number"),
  AttributeDescriptor::new("identifier", "Identifiant", "Identifier"),
];

/// The property attributes of an almanac resident entry, in display order.
static ALMANAC: [AttributeDescriptor; 9] = [
  AttributeDescriptor::new("nom", "Nom", "Name"),
  AttributeDescriptor::new("metier", "Métier", "Occupation"),
  AttributeDescriptor::new("categ", "Catégorie", "Category"),
  AttributeDescriptor::new("nomrue", "Nom de rue", "Street Name"),
  AttributeDescriptor::new("numrue", "Numéro de rue", "Street Number"),
  AttributeDescriptor::new("field_1", "Field 1", "Field 1"),
  AttributeDescriptor::new("id", "ID", "ID"),
  AttributeDescriptor::new("wkt", "Coordonnées", "Coordinates"),
  AttributeDescriptor::new("point_info", "Information sur le point", "Point Information"),
];

/// The fixed, ordered attribute set of a feature class.
#[must_use]
pub fn describe(class: FeatureClass) -> &'static [AttributeDescriptor] {
  match class {
    FeatureClass::Cadastre => &CADASTRE,
    FeatureClass::Almanac => &ALMANAC,
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn cadastre_has_seventeen_attributes() {
    let descriptors = describe(FeatureClass::Cadastre);
    assert_eq!(descriptors.len(), 17);
    assert_eq!(descriptors.first().unwrap().key, "own_name");
    assert_eq!(descriptors.last().unwrap().key, "identifier");
  }

  #[test]
  fn almanac_has_nine_attributes() {
    let descriptors = describe(FeatureClass::Almanac);
    assert_eq!(descriptors.len(), 9);
    assert_eq!(descriptors.first().unwrap().key, "nom");
    assert_eq!(descriptors.last().unwrap().key, "point_info");
  }

  #[test]
  fn every_attribute_is_bilingual() {
    for class in [FeatureClass::Cadastre, FeatureClass::Almanac] {
      for descriptor in describe(class) {
        assert!(!descriptor.label(Lang::Fr).is_empty(), "{}", descriptor.key);
        assert!(!descriptor.label(Lang::En).is_empty(), "{}", descriptor.key);
      }
    }
  }

  #[test]
  fn describe_is_deterministic() {
    let first: Vec<_> = describe(FeatureClass::Cadastre).iter().map(|d| d.key).collect();
    let second: Vec<_> = describe(FeatureClass::Cadastre).iter().map(|d| d.key).collect();
    assert_eq!(first, second);
  }

  #[test]
  fn area_format_appends_unit() {
    assert_eq!(
      ValueFormat::AreaSquareMetres.apply(Some(&json!(123.45))),
      "123.45 m²"
    );
    assert_eq!(ValueFormat::AreaSquareMetres.apply(Some(&json!(250))), "250 m²");
    assert_eq!(ValueFormat::AreaSquareMetres.apply(None), "");
  }

  #[test]
  fn verbatim_format_passes_values_through() {
    assert_eq!(ValueFormat::Verbatim.apply(Some(&json!("Dupont"))), "Dupont");
    assert_eq!(ValueFormat::Verbatim.apply(Some(&json!(7))), "7");
    assert_eq!(ValueFormat::Verbatim.apply(Some(&json!(null))), "");
    assert_eq!(ValueFormat::Verbatim.apply(None), "");
  }
}
