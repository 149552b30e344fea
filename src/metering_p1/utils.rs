use super::structs::LineKind;
use lazy_static::lazy_static;
use regex::Regex;

/// Known meter identification prefixes, checked in order
pub const TELEGRAM_HEADERS: [&str; 6] = [
    "/ISk5\\",
    "KFM5 KFM5KAIFA-METER",
    "/KFM5",
    "/KMP5",
    "/XMX5LG",
    "/Ene5",
];

lazy_static! {
    // <code>(<payload>) ending the line, first match in the line wins
    static ref OBIS_LINE: Regex = Regex::new(r"([01]-[01]:[0-9.]+)\((.+)\)$").unwrap();
}

pub fn match_header_prefix(line: &str) -> Option<&'static str> {
    TELEGRAM_HEADERS.iter().copied().find(|prefix| line.starts_with(prefix))
}

pub fn is_terminator(line: &str) -> bool {
    line.starts_with('!')
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    // Example formats:
    // /ISk5\2MT382-1000
    // 1-0:1.8.1(000123.456*kWh)
    // !
    // !A1B2

    if match_header_prefix(line).is_some() {
        return LineKind::Header(line);
    }

    if is_terminator(line) {
        return LineKind::Terminator;
    }

    match OBIS_LINE.captures(line) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(code), Some(payload)) => LineKind::FieldCandidate {
                code: code.as_str(),
                payload: payload.as_str(),
            },
            _ => LineKind::Ignored,
        },
        None => LineKind::Ignored,
    }
}
