use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Target type of a decoded OBIS value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Float,
}

impl ScalarType {
    /// Convert a grammar match into a typed value. `None` if the text
    /// cannot be represented in the target type (e.g. an empty integer).
    pub fn convert(&self, raw: &str) -> Option<ObisValue> {
        match self {
            ScalarType::String => Some(ObisValue::Str(raw.to_string())),
            ScalarType::Integer => raw.parse::<i64>().ok().map(ObisValue::Int),
            ScalarType::Float => raw.parse::<f64>().ok().map(ObisValue::Float),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "str",
            ScalarType::Integer => "int",
            ScalarType::Float => "float",
        }
    }
}

impl Serialize for ScalarType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A typed value decoded from a telegram line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObisValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl ObisValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObisValue::Float(v) => Some(*v),
            ObisValue::Int(v) => Some(*v as f64),
            ObisValue::Str(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ObisDefinition {
    #[serde(skip)]
    pub code: &'static str,
    pub description: &'static str,
    #[serde(rename = "value_regex", serialize_with = "serialize_regex")]
    pub value_grammar: Regex,
    #[serde(rename = "type")]
    pub scalar_type: ScalarType,
}

fn serialize_regex<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

// code, description, value grammar, type
const OBIS_TABLE: [(&str, &str, &str, ScalarType); 12] = [
    ("0-0:96.1.1", "Serial number", r"[A-Z0-9]+", ScalarType::String),
    ("1-0:1.8.1", "Meter Reading electricity delivered to client (Tariff 1) in 0,001 kWh", r"[0-9]+\.[0-9]{3}", ScalarType::Float),
    ("1-0:1.8.2", "Meter Reading electricity delivered to client (Tariff 2) in 0,001 kWh", r"[0-9]+\.[0-9]{3}", ScalarType::Float),
    ("1-0:2.8.1", "Meter Reading electricity delivered by client (Tariff 1) in 0,001 kWh", r"[0-9]+\.[0-9]{3}", ScalarType::Float),
    ("1-0:2.8.2", "Meter Reading electricity delivered by client (Tariff 2) in 0,001 kWh", r"[0-9]+\.[0-9]{3}", ScalarType::Float),
    ("0-0:96.14.0", "Tariff indicator", r"[0-9]{4}", ScalarType::Integer),
    ("1-0:1.7.0", "Actual electricity power delivered(+P) in 1 Watt resolution", r"[0-9]+\.[0-9]{2}", ScalarType::Float),
    ("1-0:2.7.0", "Actual electricity power received(-P) in 1 Watt resolution", r"[0-9]+\.[0-9]{2}", ScalarType::Float),
    ("0-0:17.0.0", "Maximum power per phase in kW resolution", r"[0-9]+\.[0-9]{2}", ScalarType::Float),
    ("0-0:96.3.10", "Switch position (1 is on)", r"[0-9]", ScalarType::Integer),
    ("0-0:96.13.1", "Message numeric", r"[0-9]*", ScalarType::Integer),
    ("0-0:96.13.0", "Message string", r".*", ScalarType::String),
];

lazy_static! {
    static ref OBIS_CODES: Vec<ObisDefinition> = OBIS_TABLE
        .iter()
        .map(|(code, description, grammar, scalar_type)| ObisDefinition {
            code: *code,
            description: *description,
            // The grammars are literals above, a failure here is a programming error
            value_grammar: Regex::new(grammar).expect("invalid OBIS value grammar"),
            scalar_type: *scalar_type,
        })
        .collect();

    static ref OBIS_INDEX: HashMap<&'static str, usize> = OBIS_CODES
        .iter()
        .enumerate()
        .map(|(i, def)| (def.code, i))
        .collect();
}

/// Exact, case sensitive lookup of a code in the registry.
pub fn lookup(code: &str) -> Option<&'static ObisDefinition> {
    OBIS_INDEX.get(code).map(|i| &OBIS_CODES[*i])
}

/// All known definitions in table order.
pub fn registry() -> &'static [ObisDefinition] {
    OBIS_CODES.as_slice()
}
