use super::structs::{LineKind, ParsedField};
use super::utils::classify_line;
use crate::obis_utils;
use log::debug;

/// Decode the payload of a field line according to the registry grammar of
/// its code. Unknown codes and values without a grammar match are dropped.
pub fn parse_field(code: &str, payload: &str) -> Option<ParsedField> {
    let definition = match obis_utils::lookup(code) {
        Some(definition) => definition,
        None => {
            debug!("Unknown OBIS code {}, dropping field", code);
            return None;
        }
    };

    // search, not full match: unit suffixes like *kWh stay behind
    let matched = match definition.value_grammar.find(payload) {
        Some(m) => m.as_str(),
        None => {
            debug!("Value '{}' does not match grammar of {}", payload, code);
            return None;
        }
    };

    let value = match definition.scalar_type.convert(matched) {
        Some(value) => value,
        None => {
            debug!("Value '{}' of {} is not a valid {}", matched, code, definition.scalar_type.as_str());
            return None;
        }
    };

    Some(ParsedField {
        code: definition.code,
        value,
        description: definition.description,
    })
}

/// Classify and decode a single raw line in one go.
pub fn parse_obis_line(line: &str) -> Option<ParsedField> {
    match classify_line(line) {
        LineKind::FieldCandidate { code, payload } => parse_field(code, payload),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obis_utils::ObisValue;

    #[test]
    fn test_parse_obis_line() {
        let field = parse_obis_line("1-0:1.8.1(000123.456*kWh)").unwrap();
        assert_eq!(field.code, "1-0:1.8.1");
        assert_eq!(field.value, ObisValue::Float(123.456));
        assert!(field.description.starts_with("Meter Reading electricity delivered to client (Tariff 1)"));
    }

    #[test]
    fn test_parse_integer_and_string_fields() {
        assert_eq!(parse_obis_line("0-0:96.14.0(0002)").unwrap().value, ObisValue::Int(2));
        assert_eq!(parse_obis_line("0-0:96.3.10(1)").unwrap().value, ObisValue::Int(1));
        assert_eq!(
            parse_obis_line("0-0:96.1.1(4B384547303034303436333935353037)").unwrap().value,
            ObisValue::Str("4B384547303034303436333935353037".to_string())
        );
        assert_eq!(
            parse_obis_line("0-0:96.13.0(Maintenance on tuesday)").unwrap().value,
            ObisValue::Str("Maintenance on tuesday".to_string())
        );
        assert_eq!(parse_obis_line("1-0:1.7.0(0001.23*kW)").unwrap().value, ObisValue::Float(1.23));
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert!(parse_obis_line("1-1:99.99.99(1)").is_none());
        assert!(parse_field("9-9:99.99.99", "1").is_none());
    }

    #[test]
    fn test_malformed_value_is_rejected() {
        // three decimals required
        assert!(parse_obis_line("1-0:1.8.1(000123.45*kWh)").is_none());
        assert!(parse_obis_line("0-0:96.14.0(12)").is_none());
        assert!(parse_obis_line("0-0:96.3.10(on)").is_none());
    }

    #[test]
    fn test_empty_numeric_message_is_rejected() {
        assert!(parse_field("0-0:96.13.1", "").is_none());
        // the grammar matches the empty string in front of the letters
        assert!(parse_field("0-0:96.13.1", "abc").is_none());
        assert!(parse_obis_line("0-0:96.13.1()").is_none());
        assert_eq!(parse_field("0-0:96.13.1", "42").unwrap().value, ObisValue::Int(42));
    }

    #[test]
    fn test_numeric_message_wider_than_i64_is_rejected() {
        assert!(parse_obis_line("0-0:96.13.1(12345678901234567890)").is_none());
        assert_eq!(
            parse_obis_line("0-0:96.13.1(9223372036854775807)").unwrap().value,
            ObisValue::Int(i64::MAX)
        );
    }

    #[test]
    fn test_non_field_lines() {
        assert!(parse_obis_line("/ISk5\\2MT382-1000").is_none());
        assert!(parse_obis_line("!").is_none());
        assert!(parse_obis_line("").is_none());
    }
}
