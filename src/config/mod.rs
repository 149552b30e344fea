use crate::metering_p1::meter_definitions;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "smartmeter.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse YAML config: {0}")]
    Yaml(#[from] serde_yml::Error),
    #[error("Unable to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Unknown meter template '{0}'")]
    UnknownTemplate(String),
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    N,
    E,
    O,
}

fn p1_port_default() -> String { return "/dev/ttyUSB0".to_string() }
fn p1_baudrate_default() -> u32 { return 9600 }
fn p1_bytesize_default() -> u8 { return 7 }
fn p1_parity_default() -> Parity { return Parity::E }
fn p1_stopbits_default() -> u8 { return 1 }
fn p1_timeout_default() -> u64 { return 20 }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SerialConfig {
    #[serde(default="p1_port_default")]
    pub port: String,
    #[serde(default="p1_baudrate_default")]
    pub baudrate: u32,
    #[serde(default="p1_bytesize_default")]
    pub bytesize: u8,
    #[serde(default="p1_parity_default")]
    pub parity: Parity,
    #[serde(default="p1_stopbits_default")]
    pub stopbits: u8,
    #[serde(default)]
    pub xonxoff: bool,
    #[serde(default)]
    pub rtscts: bool,
    /// Seconds to wait for a line before reporting a timeout
    #[serde(default="p1_timeout_default")]
    pub timeout: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: p1_port_default(),
            baudrate: p1_baudrate_default(),
            bytesize: p1_bytesize_default(),
            parity: p1_parity_default(),
            stopbits: p1_stopbits_default(),
            xonxoff: false,
            rtscts: false,
            timeout: p1_timeout_default(),
        }
    }
}

impl SerialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("port must not be empty".to_string()));
        }
        if self.baudrate == 0 {
            return Err(ConfigError::Invalid("baudrate must be greater than 0".to_string()));
        }
        if !(5..=8).contains(&self.bytesize) {
            return Err(ConfigError::Invalid(format!("bytesize {} invalid, valid values: 5, 6, 7, 8", self.bytesize)));
        }
        if self.stopbits != 1 && self.stopbits != 2 {
            return Err(ConfigError::Invalid(format!("stopbits {} invalid, valid values: 1, 2", self.stopbits)));
        }
        if self.xonxoff && self.rtscts {
            return Err(ConfigError::Invalid("xonxoff and rtscts can not be enabled together".to_string()));
        }
        if self.timeout == 0 {
            return Err(ConfigError::Invalid("timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Json,
    Log,
}

fn output_mode_default() -> OutputMode { return OutputMode::Json }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OutputConfig {
    #[serde(default="output_mode_default")]
    pub mode: OutputMode,
}

fn p1_default() -> SerialConfig { return SerialConfig::default() }
fn output_default() -> OutputConfig { return OutputConfig { mode: output_mode_default() } }

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default="p1_default")]
    pub p1: SerialConfig,
    #[serde(default="output_default")]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config { p1: p1_default(), output: output_default() }
    }
}

impl Config {
    /// Load and validate a config file. `.json` files are read as JSON, everything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let is_json = path.extension().map(|ext| ext.eq_ignore_ascii_case("json")).unwrap_or(false);

        let config: Config = if is_json {
            serde_json::from_str(&contents)?
        } else {
            serde_yml::from_str(&contents)?
        };

        config.p1.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Config::load(path)
    }

    /// An explicitly requested file must exist, only the default path may be absent.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                info!("Reading config file {}", path.display());
                Config::load(path)
            }
            None => Config::load_or_default(Path::new(DEFAULT_CONFIG_PATH)),
        }
    }

    /// Replace the serial section by a named meter template, keeping the configured port.
    pub fn apply_template(&mut self, name: &str) -> Result<(), ConfigError> {
        let mut template = meter_definitions::get_meter_template(name)
            .ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))?;
        template.port = self.p1.port.clone();
        self.p1 = template;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.p1.port, "/dev/ttyUSB0");
        assert_eq!(config.p1.baudrate, 9600);
        assert_eq!(config.p1.bytesize, 7);
        assert_eq!(config.p1.parity, Parity::E);
        assert_eq!(config.p1.stopbits, 1);
        assert_eq!(config.p1.timeout, 20);
        assert_eq!(config.output.mode, OutputMode::Json);
        assert!(config.p1.validate().is_ok());
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(".yaml", "p1:\n  port: /dev/ttyAMA0\n  baudrate: 115200\n  bytesize: 8\n  parity: N\noutput:\n  mode: log\n");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.p1.port, "/dev/ttyAMA0");
        assert_eq!(config.p1.baudrate, 115200);
        assert_eq!(config.p1.parity, Parity::N);
        // missing keys use defaults
        assert_eq!(config.p1.stopbits, 1);
        assert_eq!(config.p1.timeout, 20);
        assert_eq!(config.output.mode, OutputMode::Log);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(".json", r#"{"p1": {"port": "/dev/ttyUSB1", "baudrate": 9600, "bytesize": 7, "parity": "E", "stopbits": 1, "xonxoff": false, "rtscts": false, "timeout": 20}}"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.p1.port, "/dev/ttyUSB1");
        assert_eq!(config.output.mode, OutputMode::Json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = write_config(".yaml", "p1:\n  bytesize: 9\n");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));

        let file = write_config(".yaml", "p1:\n  xonxoff: true\n  rtscts: true\n");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Invalid(_))));

        let file = write_config(".yaml", "p1:\n  parity: X\n");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(matches!(Config::load(&path), Err(ConfigError::Io(_))));
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_resolve_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("explicit.yaml");
        assert!(matches!(Config::resolve(Some(&path)), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_resolve_explicit_file() {
        let file = write_config(".yaml", "p1:\n  port: /dev/ttyS1\n");
        let config = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(config.p1.port, "/dev/ttyS1");
    }

    #[test]
    fn test_apply_template() {
        let mut config = Config::default();
        config.p1.port = "/dev/ttyAMA0".to_string();
        config.apply_template("dsmr4").unwrap();
        assert_eq!(config.p1.baudrate, 115200);
        assert_eq!(config.p1.port, "/dev/ttyAMA0");
        assert!(matches!(config.apply_template("nope"), Err(ConfigError::UnknownTemplate(_))));
    }

    #[test]
    fn test_serial_validate() {
        let mut serial = SerialConfig::default();
        serial.stopbits = 3;
        assert!(serial.validate().is_err());
        serial.stopbits = 2;
        assert!(serial.validate().is_ok());
        serial.baudrate = 0;
        assert!(serial.validate().is_err());
    }
}
