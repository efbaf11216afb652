use crate::error::ExecError;

/// Captured output of one run plus the failure, if any.
///
/// Output is kept on every path where something actually ran, so a killed
/// or failing command still reports what it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub output: String,
    pub error: Option<ExecError>,
}

impl RunOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    pub fn failed(output: impl Into<String>, error: ExecError) -> Self {
        Self {
            output: output.into(),
            error: Some(error),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Error text for the wire; empty on success.
    pub fn error_message(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}
