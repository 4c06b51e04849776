//! Conversion between JSON documents and DynamoDB items.
//!
//! Documents are stored verbatim: object keys become attribute names and nesting is kept through
//! `M` and `L` attributes. String and number sets read back as plain JSON arrays.

use std::collections::HashMap;

use aws_sdk_dynamodb::model::AttributeValue;
use serde_json::{Map, Number, Value};

pub type Item = HashMap<String, AttributeValue>;

pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(to_item(map)),
    }
}

pub fn from_attribute(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(values) => Value::Array(values.iter().map(from_attribute).collect()),
        AttributeValue::M(map) => Value::Object(from_item(map)),
        AttributeValue::Ss(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(values) => Value::Array(values.iter().map(|n| parse_number(n)).collect()),
        _ => Value::Null,
    }
}

pub fn to_item(document: &Map<String, Value>) -> Item {
    document
        .iter()
        .map(|(name, value)| (name.clone(), to_attribute(value)))
        .collect()
}

pub fn from_item(item: &Item) -> Map<String, Value> {
    item.iter()
        .map(|(name, attr)| (name.clone(), from_attribute(attr)))
        .collect()
}

fn parse_number(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Value::Number(n.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_owned()))
}
