use std::{path::PathBuf, time::Duration};

use cronx_model::HTTP_MAX_TIMEOUT_SECS;

/// Text encoding the host uses for process output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    Utf8,
    /// Simplified-Chinese Windows console code page (CP936).
    Gbk,
}

impl Default for OutputEncoding {
    fn default() -> Self {
        if cfg!(windows) {
            OutputEncoding::Gbk
        } else {
            OutputEncoding::Utf8
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Wait between the graceful terminate and the forced tree kill.
    pub grace_period: Duration,
    pub encoding: OutputEncoding,
    /// Working directory; `None` means the invoking user's home (or temp) dir.
    pub work_dir: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(2),
            encoding: OutputEncoding::default(),
            work_dir: None,
        }
    }
}

impl ShellConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.grace_period.is_zero() {
            return Err("grace period must be positive".into());
        }
        if let Some(dir) = &self.work_dir
            && !dir.is_dir()
        {
            return Err(format!("work dir {} is not a directory", dir.display()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Hard ceiling for any single HTTP task.
    pub max_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_timeout: Duration::from_secs(u64::from(HTTP_MAX_TIMEOUT_SECS)),
            user_agent: concat!("cronx-node/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ShellConfig::default().validate().is_ok());
        assert_eq!(ShellConfig::default().grace_period, Duration::from_secs(2));
        assert_eq!(HttpConfig::default().max_timeout, Duration::from_secs(300));
    }

    #[test]
    fn zero_grace_is_rejected() {
        let cfg = ShellConfig {
            grace_period: Duration::ZERO,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_work_dir_is_rejected() {
        let cfg = ShellConfig {
            work_dir: Some(PathBuf::from("/definitely/not/here/cronx")),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
