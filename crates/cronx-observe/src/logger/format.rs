use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Output sink for the node's log events.
///
/// Every variant parses on every platform; whether `journald` can actually be
/// installed is answered by [`LoggerFormat::is_available`] and enforced when
/// the config is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerFormat {
    /// Human readable lines on stdout.
    Text,
    /// One JSON object per event on stdout.
    Json,
    /// Native systemd journal fields.
    Journald,
}

impl LoggerFormat {
    pub const ALL: [LoggerFormat; 3] = [LoggerFormat::Text, LoggerFormat::Json, LoggerFormat::Journald];

    pub fn as_str(self) -> &'static str {
        match self {
            LoggerFormat::Text => "text",
            LoggerFormat::Json => "json",
            LoggerFormat::Journald => "journald",
        }
    }

    /// Whether this build can install the format.
    pub fn is_available(self) -> bool {
        match self {
            LoggerFormat::Text | LoggerFormat::Json => true,
            LoggerFormat::Journald => cfg!(all(target_os = "linux", feature = "journald")),
        }
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        // `journal` is what systemd unit files tend to say.
        if name.eq_ignore_ascii_case("journal") {
            return Ok(LoggerFormat::Journald);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| LoggerError::InvalidFormat(s.to_string()))
    }
}
