//! DSMR P1 telegram reader
//!
//! This library turns the line oriented output of a smart meter P1 port into
//! typed telegram records, plus the serial, config and output plumbing around it.

pub mod config;
pub mod line_source;
pub mod metering_p1;
pub mod obis_utils;
pub mod output;

// Re-export common types for easier access
pub use config::{Config, OutputMode, SerialConfig};
pub use line_source::LineSource;
pub use metering_p1::{CompletedTelegram, LineEvent, P1Manager, Telegram, TelegramAccumulator};
pub use obis_utils::{ObisValue, ScalarType};
