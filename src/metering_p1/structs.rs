use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::obis_utils::ObisValue;

/// The telegram under construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telegram {
    pub header: String,
    #[serde(rename = "data")]
    pub fields: BTreeMap<String, ObisValue>,
    #[serde(skip)]
    pub last_update_time: DateTime<Utc>,
}

impl Telegram {
    pub fn new() -> Self {
        Self {
            header: String::new(),
            fields: BTreeMap::new(),
            last_update_time: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }

    /// Back to the empty state, keeps the allocated header buffer.
    pub fn reset(&mut self) {
        self.header.clear();
        self.fields.clear();
        self.last_update_time = DateTime::<Utc>::UNIX_EPOCH;
    }
}

impl Default for Telegram {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of classifying one raw line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Header(&'a str),
    FieldCandidate { code: &'a str, payload: &'a str },
    Terminator,
    Ignored,
}

/// A field accepted by the registry grammar
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedField {
    pub code: &'static str,
    pub value: ObisValue,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorState {
    Empty,
    Open,
}

/// What a single consumed line did to the telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Ignored,
    HeaderSet,
    FieldUpdated(&'static str),
    /// Field shaped line with an unknown code or a value not matching its grammar
    FieldRejected,
    /// Terminator seen with a header present, the telegram is ready
    Complete,
    /// Terminator seen before any header
    TerminatorWithoutHeader,
}

impl LineEvent {
    pub fn is_terminator(&self) -> bool {
        matches!(self, LineEvent::Complete | LineEvent::TerminatorWithoutHeader)
    }
}

/// Snapshot handed to the sink once a telegram is complete
#[derive(Debug, Clone)]
pub struct CompletedTelegram {
    pub telegram: Telegram,
    pub raw_lines: Vec<String>,
}
