use std::io::IsTerminal;

use crate::logger::{error::LoggerError, format::LoggerFormat};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `cronx=debug,tonic=warn`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl LoggerConfig {
    /// Build a config from the textual knobs exposed on the command line.
    pub fn from_parts(format: &str, level: impl Into<String>) -> Result<Self, LoggerError> {
        let cfg = Self {
            format: format.parse()?,
            level: level.into(),
            ..Default::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), LoggerError> {
        if !self.format.is_available() {
            return Err(LoggerError::JournaldNotSupported);
        }
        super::log::filter(&self.level).map(|_| ())
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}
