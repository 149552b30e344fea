use crate::config::OutputMode;
use crate::metering_p1::{CompletedTelegram, Telegram};
use crate::obis_utils::{self, ObisValue};
use chrono::{DateTime, TimeZone};
use log::{debug, error, info};
use std::fmt::Display;

/// JSON document for one telegram: header, decoded data, timestamp and the registry metadata
pub fn render_json<Tz: TimeZone>(telegram: &Telegram, now: &DateTime<Tz>) -> serde_json::Value
where
    Tz::Offset: Display,
{
    let mut document = match serde_json::to_value(telegram) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };

    let mut obiscodes = serde_json::Map::new();
    for definition in obis_utils::registry() {
        let metadata = serde_json::to_value(definition).unwrap_or(serde_json::Value::Null);
        obiscodes.insert(definition.code.to_string(), metadata);
    }

    document.insert("datetime".to_string(), now.to_rfc3339().into());
    document.insert("obiscodes".to_string(), obiscodes.into());
    serde_json::Value::Object(document)
}

pub fn summarize(telegram: &Telegram) -> String {
    let reading = |code: &str| telegram.fields.get(code).and_then(ObisValue::as_f64);
    let fmt = |v: Option<f64>| v.map(|v| format!("{}", v)).unwrap_or_else(|| "-".to_string());
    format!(
        "{}: delivered T1 {} kWh, T2 {} kWh, power {} kW ({} fields)",
        telegram.header,
        fmt(reading("1-0:1.8.1")),
        fmt(reading("1-0:1.8.2")),
        fmt(reading("1-0:1.7.0")),
        telegram.fields.len()
    )
}

/// Hand one completed telegram to the configured sink
pub fn emit(completed: &CompletedTelegram, mode: OutputMode) {
    debug!("Content of telegram:\n{:#?}", completed.telegram);
    match mode {
        OutputMode::Json => {
            let document = render_json(&completed.telegram, &chrono::Local::now());
            match serde_json::to_string_pretty(&document) {
                Ok(text) => println!("{}", text),
                Err(e) => error!("Unable to serialize telegram: {}", e),
            }
        }
        OutputMode::Log => info!("{}", summarize(&completed.telegram)),
    }
}
