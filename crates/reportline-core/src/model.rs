//! The key/value model bound into a template.
//!
//! A [`Model`] is built once (through [`ModelBuilder`]) and never mutated
//! afterwards; the binder only reads from it.

use chrono::NaiveDate;
use reportline_engine::engine::{format_date, format_number};
use std::collections::{BTreeMap, BTreeSet};

/// A typed model value.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl ModelValue {
    /// Text form used when the value is spliced into surrounding text.
    pub fn render(&self) -> String {
        match self {
            ModelValue::Text(s) => s.clone(),
            ModelValue::Number(n) => format_number(*n),
            ModelValue::Date(d) => format_date(*d),
        }
    }
}

impl From<&str> for ModelValue {
    fn from(value: &str) -> Self {
        ModelValue::Text(value.to_string())
    }
}

impl From<String> for ModelValue {
    fn from(value: String) -> Self {
        ModelValue::Text(value)
    }
}

impl From<f64> for ModelValue {
    fn from(value: f64) -> Self {
        ModelValue::Number(value)
    }
}

impl From<i64> for ModelValue {
    fn from(value: i64) -> Self {
        ModelValue::Number(value as f64)
    }
}

impl From<i32> for ModelValue {
    fn from(value: i32) -> Self {
        ModelValue::Number(value.into())
    }
}

impl From<u32> for ModelValue {
    fn from(value: u32) -> Self {
        ModelValue::Number(value.into())
    }
}

impl From<NaiveDate> for ModelValue {
    fn from(value: NaiveDate) -> Self {
        ModelValue::Date(value)
    }
}

/// Immutable mapping from placeholder key to value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    values: BTreeMap<String, ModelValue>,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&ModelValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<ModelValue>> FromIterator<(K, V)> for Model {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Model {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Key of `field` for the 1-based row `slot` of a paginated template.
pub fn slot_key(field: &str, slot: usize) -> String {
    format!("{}_{}", field, slot)
}

#[derive(Clone, Debug, Default)]
pub struct ModelBuilder {
    values: BTreeMap<String, ModelValue>,
}

impl ModelBuilder {
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<ModelValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Copy every entry of `model`, overriding existing keys.
    pub fn extend(mut self, model: &Model) -> Self {
        for (key, value) in &model.values {
            self.values.insert(key.clone(), value.clone());
        }
        self
    }

    /// Lay out `rows` into `capacity` numbered slots.
    ///
    /// Row `i` (1-based) contributes `field_i` for each of its fields. Slots
    /// past the last row bind every known field to empty text, so unused
    /// template rows render blank.
    pub fn slots<'a, I>(mut self, capacity: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Model>,
    {
        let rows: Vec<&Model> = rows.into_iter().collect();
        let fields: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.values.keys().map(String::as_str))
            .collect();

        for slot in 1..=capacity.max(rows.len()) {
            match rows.get(slot - 1) {
                Some(row) => {
                    for (field, value) in &row.values {
                        self.values.insert(slot_key(field, slot), value.clone());
                    }
                }
                None => {
                    for field in &fields {
                        self.values
                            .insert(slot_key(field, slot), ModelValue::Text(String::new()));
                    }
                }
            }
        }
        self
    }

    pub fn build(self) -> Model {
        Model {
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_values() {
        assert_eq!(ModelValue::from("Nowak").render(), "Nowak");
        assert_eq!(ModelValue::from(37.5).render(), "37.5");
        assert_eq!(ModelValue::from(2024).render(), "2024");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(ModelValue::from(date).render(), "2024-03-01");
    }

    #[test]
    fn test_builder_and_lookup() {
        let model = Model::builder()
            .insert("hours", 37.5)
            .insert("name", "Jan Kowalski")
            .build();
        assert_eq!(model.get("hours"), Some(&ModelValue::Number(37.5)));
        assert!(model.contains_key("name"));
        assert!(model.get("deciders").is_none());
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_slots_fill_unused_rows_with_empty_text() {
        let anna: Model = [("name", "Anna Nowak")].into_iter().collect();
        let jan = Model::builder()
            .insert("name", "Jan Kowalski")
            .insert("hours", 160)
            .build();

        let model = Model::builder().insert("month", 3).slots(3, [&anna, &jan]).build();

        assert_eq!(model.get("month"), Some(&ModelValue::Number(3.0)));
        assert_eq!(model.get("name_1"), Some(&ModelValue::from("Anna Nowak")));
        assert_eq!(model.get("name_2"), Some(&ModelValue::from("Jan Kowalski")));
        assert_eq!(model.get("hours_2"), Some(&ModelValue::Number(160.0)));
        assert_eq!(model.get("name_3"), Some(&ModelValue::from("")));
        assert_eq!(model.get("hours_3"), Some(&ModelValue::from("")));
        // a row missing a field does not get a blank for it
        assert!(model.get("hours_1").is_none());
    }
}
