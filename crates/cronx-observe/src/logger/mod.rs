mod config;
mod error;
mod format;
mod log;

pub use config::LoggerConfig;
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// The config is validated before anything global is touched, so a bad
/// filter or an unavailable format leaves the process without a subscriber.
/// Fails with [`LoggerError::AlreadyInitialized`] when one is already set.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    cfg.validate()?;
    match cfg.format {
        LoggerFormat::Text => log::Logger::text(cfg)?,
        LoggerFormat::Json => log::Logger::json(cfg)?,
        LoggerFormat::Journald => log::Logger::journald(cfg)?,
    }
    tracing::debug!(target: "cronx.observe", format = %cfg.format, level = %cfg.level, "logger installed");
    Ok(())
}
