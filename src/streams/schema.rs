use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON schema types a sample value can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Integer,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match *self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
        }
    }
}

/// Map a sample value to a schema type. Anything that is not a string,
/// boolean or number (null, arrays, objects) is typed as string.
pub fn infer_field_type(value: &Value) -> FieldType {
    match value {
        Value::String(_) => FieldType::String,
        // booleans first: they must never be reported as integers
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => FieldType::Integer,
        Value::Number(_) => FieldType::Number,
        _ => FieldType::String,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub field_type: FieldType,
}

impl Property {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self { name: name.into(), field_type }
    }
}

/// Ordered property list of an object schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertiesList(pub Vec<Property>);

impl PropertiesList {
    /// One property per key of a sample object, in the sample's key order.
    pub fn from_sample(sample: &Map<String, Value>) -> Self {
        sample
            .iter()
            .map(|(name, value)| Property::new(name.as_str(), infer_field_type(value)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.0.iter().find(|p| p.name == name).map(|p| p.field_type)
    }

    /// Nullable JSON schema object: `{"type": "object", "properties": {...}}`.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .0
            .iter()
            .map(|p| (p.name.clone(), json!({ "type": [p.field_type.as_str(), "null"] })))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
        })
    }
}

impl FromIterator<Property> for PropertiesList {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_are_never_integers() {
        assert_eq!(infer_field_type(&json!(true)), FieldType::Boolean);
        assert_eq!(infer_field_type(&json!(false)), FieldType::Boolean);
    }

    #[test]
    fn scalar_values_map_to_their_type() {
        assert_eq!(infer_field_type(&json!(3.14)), FieldType::Number);
        assert_eq!(infer_field_type(&json!(7)), FieldType::Integer);
        assert_eq!(infer_field_type(&json!(-7)), FieldType::Integer);
        assert_eq!(infer_field_type(&json!("x")), FieldType::String);
    }

    #[test]
    fn everything_else_falls_back_to_string() {
        assert_eq!(infer_field_type(&Value::Null), FieldType::String);
        assert_eq!(infer_field_type(&json!(["a"])), FieldType::String);
        assert_eq!(infer_field_type(&json!({ "a": 1 })), FieldType::String);
    }

    #[test]
    fn sample_person_builds_ordered_properties() {
        let sample = json!({ "id": 1, "first_name": "Ann", "age": 30, "active": true });
        let properties = PropertiesList::from_sample(sample.as_object().unwrap());

        assert_eq!(
            properties,
            PropertiesList(vec![
                Property::new("id", FieldType::Integer),
                Property::new("first_name", FieldType::String),
                Property::new("age", FieldType::Integer),
                Property::new("active", FieldType::Boolean),
            ])
        );
    }

    #[test]
    fn json_schema_marks_every_property_nullable() {
        let properties = PropertiesList(vec![
            Property::new("id", FieldType::Integer),
            Property::new("email", FieldType::String),
        ]);

        assert_eq!(
            properties.to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": ["integer", "null"] },
                    "email": { "type": ["string", "null"] }
                }
            })
        );
    }

    #[test]
    fn empty_list_renders_empty_properties() {
        assert_eq!(
            PropertiesList::default().to_json_schema(),
            json!({ "type": "object", "properties": {} })
        );
    }
}
