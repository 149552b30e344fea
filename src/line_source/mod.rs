#[cfg(feature = "serial")]
use crate::config::SerialConfig;
use log::debug;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Exception while reading from line source: {0}")]
    Io(#[from] std::io::Error),
    #[error("No line received within {0:?}")]
    Timeout(Duration),
    #[cfg(feature = "serial")]
    #[error("Exception while opening serial connection: {0}")]
    Serial(#[from] tokio_serial::Error),
}

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// Decoded text lines with CR/LF stripped, one at a time
pub struct LineSource {
    lines: Lines<BufReader<BoxedReader>>,
    timeout: Option<Duration>,
}

impl LineSource {
    pub fn from_reader<R: AsyncRead + Unpin + Send + 'static>(reader: R, timeout: Option<Duration>) -> Self {
        let reader: BoxedReader = Box::new(reader);
        Self {
            lines: BufReader::new(reader).lines(),
            timeout,
        }
    }

    #[cfg(feature = "serial")]
    pub fn open_serial(config: &SerialConfig) -> Result<Self, SourceError> {
        use log::info;
        use tokio_serial::{DataBits, FlowControl, Parity, SerialStream, StopBits};

        let data_bits = match config.bytesize {
            5 => DataBits::Five,
            6 => DataBits::Six,
            7 => DataBits::Seven,
            _ => DataBits::Eight,
        };
        let parity = match config.parity {
            crate::config::Parity::N => Parity::None,
            crate::config::Parity::E => Parity::Even,
            crate::config::Parity::O => Parity::Odd,
        };
        let stop_bits = if config.stopbits == 2 { StopBits::Two } else { StopBits::One };
        let flow_control = if config.rtscts {
            FlowControl::Hardware
        } else if config.xonxoff {
            FlowControl::Software
        } else {
            FlowControl::None
        };

        info!("Open connection to {} ({} baud)", config.port, config.baudrate);
        let builder = tokio_serial::new(&config.port, config.baudrate)
            .data_bits(data_bits)
            .parity(parity)
            .stop_bits(stop_bits)
            .flow_control(flow_control);
        let stream = SerialStream::open(&builder)?;
        info!("Connection is open");

        Ok(Self::from_reader(stream, Some(Duration::from_secs(config.timeout))))
    }

    pub async fn open_file(path: &Path) -> Result<Self, SourceError> {
        debug!("Replaying lines from {}", path.display());
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::from_reader(file, None))
    }

    pub fn stdin() -> Self {
        Self::from_reader(tokio::io::stdin(), None)
    }

    /// Next line, `None` once the stream is exhausted.
    pub async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        let line = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.lines.next_line())
                .await
                .map_err(|_| SourceError::Timeout(timeout))??,
            None => self.lines.next_line().await?,
        };
        Ok(line)
    }
}
