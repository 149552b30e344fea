use crate::line_source::{LineSource, SourceError};
use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::mpsc::Sender;

pub mod utils;
pub mod structs;
pub mod obis_parser;
pub mod meter_definitions;

pub use structs::{AccumulatorState, CompletedTelegram, LineEvent, LineKind, ParsedField, Telegram};

/// Line the serial link emits between telegrams, never handed to the accumulator
pub const NUL_SENTINEL: &str = "\x00";

/// Upper bound of raw lines kept for one telegram, oldest lines are dropped first
pub const MAX_RAW_LINES: usize = 1024;

/// Collects lines into one telegram until a terminator completes it.
/// Never resets itself, the caller decides when a telegram is consumed.
#[derive(Debug, Default)]
pub struct TelegramAccumulator {
    telegram: Telegram,
}

impl TelegramAccumulator {
    pub fn new() -> Self {
        Self { telegram: Telegram::new() }
    }

    pub fn consume(&mut self, line: &str) -> LineEvent {
        match utils::classify_line(line) {
            LineKind::Header(header) => {
                self.telegram.header.clear();
                self.telegram.header.push_str(header);
                self.telegram.last_update_time = Utc::now();
                LineEvent::HeaderSet
            }
            LineKind::FieldCandidate { code, payload } => match obis_parser::parse_field(code, payload) {
                Some(field) => {
                    self.telegram.fields.insert(field.code.to_string(), field.value);
                    self.telegram.last_update_time = Utc::now();
                    LineEvent::FieldUpdated(field.code)
                }
                None => LineEvent::FieldRejected,
            },
            LineKind::Terminator => {
                if self.telegram.has_header() {
                    LineEvent::Complete
                } else {
                    LineEvent::TerminatorWithoutHeader
                }
            }
            LineKind::Ignored => LineEvent::Ignored,
        }
    }

    pub fn state(&self) -> AccumulatorState {
        if self.telegram.has_header() {
            AccumulatorState::Open
        } else {
            AccumulatorState::Empty
        }
    }

    pub fn telegram(&self) -> &Telegram {
        &self.telegram
    }

    pub fn reset(&mut self) {
        self.telegram.reset();
    }
}

/// Drives an accumulator from a line source and hands finished telegrams to a sink
pub struct P1Manager {
    sender: Sender<CompletedTelegram>,
    accumulator: TelegramAccumulator,
    raw_lines: Vec<String>,
}

impl P1Manager {
    pub fn new(sender: Sender<CompletedTelegram>) -> Self {
        Self {
            sender,
            accumulator: TelegramAccumulator::new(),
            raw_lines: Vec::new(),
        }
    }

    /// Read until the stream ends or `limit` telegrams were emitted (0 = no limit).
    /// Returns the number of emitted telegrams.
    pub async fn start_thread(&mut self, mut source: LineSource, limit: u32) -> Result<u32, SourceError> {
        info!("Starting P1 reader, telegram limit {}", limit);
        let mut telegram_counter: u32 = 0;

        loop {
            let line = match source.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("Line source closed");
                    break;
                }
                Err(SourceError::Timeout(after)) => {
                    warn!("No data from meter within {:?}, still waiting", after);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if self.handle_line(line).await {
                telegram_counter += 1;
                if limit > 0 && telegram_counter >= limit {
                    info!("Telegram limit of {} reached", limit);
                    break;
                }
            }
        }

        Ok(telegram_counter)
    }

    /// Feed one line. Returns true if it completed and emitted a telegram.
    pub async fn handle_line(&mut self, line: String) -> bool {
        if line == NUL_SENTINEL {
            return false;
        }
        debug!("{}", line);

        let event = self.accumulator.consume(&line);
        if self.raw_lines.len() >= MAX_RAW_LINES {
            self.raw_lines.remove(0);
        }
        self.raw_lines.push(line);

        let mut emitted = false;
        match event {
            LineEvent::Complete => {
                let completed = CompletedTelegram {
                    telegram: self.accumulator.telegram().clone(),
                    raw_lines: self.raw_lines.clone(),
                };
                info!("Telegram complete with {} fields", completed.telegram.fields.len());
                if self.sender.send(completed).await.is_err() {
                    warn!("Telegram receiver is gone, dropping telegram");
                }
                emitted = true;
            }
            LineEvent::TerminatorWithoutHeader => {
                debug!(
                    "End of telegram reached but we don't have a header, dropping {} fields",
                    self.accumulator.telegram().fields.len()
                );
            }
            _ => {}
        }

        if event.is_terminator() {
            self.accumulator.reset();
            self.raw_lines.clear();
        }

        emitted
    }

    pub fn accumulator(&self) -> &TelegramAccumulator {
        &self.accumulator
    }
}
