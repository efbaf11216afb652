use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, fmt, fmt::time::OffsetTime, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

/// Transport crates that flood `debug` with per-frame events. Kept at `info`
/// unless the filter names them explicitly.
const NOISY_TARGETS: &[&str] = &["h2", "hyper", "tower", "rustls"];

pub(crate) struct Logger;

impl Logger {
    pub(crate) fn text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let layer = fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(local_timer());
        install(tracing_subscriber::registry().with(filter(&cfg.level)?).with(layer))
    }

    pub(crate) fn json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(local_timer());
        install(tracing_subscriber::registry().with(filter(&cfg.level)?).with(layer))
    }

    pub(crate) fn journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        journald(filter(&cfg.level)?)
    }
}

pub(crate) fn filter(level: &str) -> Result<EnvFilter, LoggerError> {
    let mut filter =
        EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))?;
    for target in NOISY_TARGETS {
        if !level.contains(target) {
            let directive = format!("{target}=info")
                .parse()
                .map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))?;
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}

// Local offset lookup fails once other threads exist; fall back to UTC.
fn local_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

fn install<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    subscriber.try_init().map_err(|e| {
        let msg = e.to_string();
        // Either the `log` bridge or the tracing dispatcher was already set.
        if msg.contains("global default") || msg.contains("already initialized") {
            LoggerError::AlreadyInitialized
        } else {
            LoggerError::InitializationFailed(msg)
        }
    })
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald(filter: EnvFilter) -> Result<(), LoggerError> {
    let layer = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?
        .with_syslog_identifier("cronx-node".to_string());
    install(tracing_subscriber::registry().with(filter).with(layer))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald(_filter: EnvFilter) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_directives() {
        assert!(filter("info").is_ok());
        assert!(filter("cronx=debug,h2=trace").is_ok());
    }

    #[test]
    fn filter_rejects_garbage() {
        assert!(matches!(
            filter("cronx=loud"),
            Err(LoggerError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn second_init_reports_already_initialized() {
        let cfg = LoggerConfig::default();
        // Another test in this binary may have won the race; either way the
        // second call must fail the same way.
        let _ = Logger::text(&cfg);
        assert!(matches!(
            Logger::text(&cfg),
            Err(LoggerError::AlreadyInitialized)
        ));
    }
}
