use thiserror::Error;

/// How severe an error is. Only non-warning errors flip a sensor's
/// status to [`Status::Error`](crate::sensor::Status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

/// What went wrong. One variant per failure mode of the sync engine.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("malformed message: {0}")]
    Format(String),

    #[error("configuration not found: {0}")]
    ConfigNotFound(String),

    #[error("value not found: {0}")]
    ValueNotFound(String),

    #[error("{value:?} does not parse as {target}")]
    TypeConversion { value: String, target: &'static str },

    #[error("unknown sensor type: {0}")]
    UnknownSensorType(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Error type used throughout the crate.
///
/// Carries a kind, a severity and an optional boxed cause. The cause is
/// exclusively owned by this value and is released when it is dropped;
/// it is exposed through [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct TwinError {
    kind: ErrorKind,
    severity: Severity,
    #[source]
    cause: Option<Box<TwinError>>,
}

impl TwinError {
    fn new(kind: ErrorKind, severity: Severity) -> Self {
        Self {
            kind,
            severity,
            cause: None,
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format(message.into()), Severity::Error)
    }

    pub fn config_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigNotFound(message.into()), Severity::Error)
    }

    pub fn value_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueNotFound(message.into()), Severity::Error)
    }

    pub fn type_conversion(value: impl Into<String>, target: &'static str) -> Self {
        Self::new(
            ErrorKind::TypeConversion {
                value: value.into(),
                target,
            },
            Severity::Critical,
        )
    }

    pub fn unknown_sensor_type(kind: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownSensorType(kind.into()), Severity::Error)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport(message.into()), Severity::Error)
    }

    /// Downgrade to a warning; the owning sensor's status stays `Ok`.
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn critical(mut self) -> Self {
        self.severity = Severity::Critical;
        self
    }

    /// Chain an originating error for diagnostic context.
    pub fn caused_by(mut self, cause: TwinError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn cause(&self) -> Option<&TwinError> {
        self.cause.as_deref()
    }
}
