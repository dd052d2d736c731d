// Shaped values
//
// The validator's output: a tree whose objects keep their fields in
// schema order and carry the `xsi:type` discriminator wherever the
// concrete type has to be spelled out on the wire.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Attribute name the discriminator is rendered under
pub const XSI_TYPE_ATTRIBUTE: &str = "xsi:type";

/// A validated value ready for serialization
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedValue {
    String(String),
    /// `int` and `long` values, and integral `double` values
    Int(i64),
    Double(f64),
    Boolean(bool),
    /// Complex value serialized under its field's element name
    Object(ShapedObject),
    /// Choice value serialized under an element named by its concrete type
    Choice(ShapedObject),
    /// Values of a repeated field, in input order
    List(Vec<ShapedValue>),
}

impl ShapedValue {
    pub fn as_object(&self) -> Option<&ShapedObject> {
        match self {
            ShapedValue::Object(obj) | ShapedValue::Choice(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ShapedValue]> {
        match self {
            ShapedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ShapedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ShapedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ShapedValue::Double(f) => Some(*f),
            ShapedValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ShapedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Concrete type recorded for serialization, if any
    pub fn discriminator(&self) -> Option<&str> {
        match self {
            ShapedValue::Object(obj) => obj.xsi_type.as_deref(),
            ShapedValue::Choice(obj) => Some(&obj.type_name),
            _ => None,
        }
    }

    /// Looks up a field of an object value
    pub fn get(&self, name: &str) -> Option<&ShapedValue> {
        self.as_object().and_then(|obj| obj.get(name))
    }
}

/// A named field of a shaped object
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedField {
    pub name: String,
    pub value: ShapedValue,
}

impl ShapedField {
    pub fn new(name: &str, value: ShapedValue) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// A complex value whose fields follow schema resolution order
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedObject {
    /// Concrete type the value was shaped against
    pub type_name: String,
    /// Discriminator to emit as `xsi:type`, set when the caller named the
    /// concrete type explicitly
    pub xsi_type: Option<String>,
    /// Present fields, in schema order
    pub fields: Vec<ShapedField>,
}

impl ShapedObject {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            xsi_type: None,
            fields: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ShapedValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    /// Names of the present fields in serialization order
    pub fn order(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Shaped positional arguments of one method call
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedParams {
    /// Method the arguments were validated for
    pub method: String,
    /// Supplied parameters in signature order; omitted optional
    /// parameters are absent
    pub fields: Vec<ShapedField>,
}

impl ShapedParams {
    pub fn get(&self, name: &str) -> Option<&ShapedValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn order(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Serialization writes entries in call order, so the rendered JSON keeps
// schema order even though serde_json's own Map would sort keys.

impl Serialize for ShapedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ShapedValue::String(s) => serializer.serialize_str(s),
            ShapedValue::Int(i) => serializer.serialize_i64(*i),
            ShapedValue::Double(f) => serializer.serialize_f64(*f),
            ShapedValue::Boolean(b) => serializer.serialize_bool(*b),
            ShapedValue::Object(obj) => obj.serialize(serializer),
            ShapedValue::Choice(obj) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&obj.type_name, obj)?;
                map.end()
            }
            ShapedValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for ShapedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let attribute = usize::from(self.xsi_type.is_some());
        let mut map = serializer.serialize_map(Some(self.fields.len() + attribute))?;
        if let Some(xsi_type) = &self.xsi_type {
            map.serialize_entry(XSI_TYPE_ATTRIBUTE, xsi_type)?;
        }
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

impl Serialize for ShapedParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}
