/// Result alias that carries the custom [`AnimError`] type.
pub type Result<T> = std::result::Result<T, AnimError>;

/// Common error type for the core crate.
///
/// Chain scheduling itself never fails; these errors come from the
/// configuration surface and from callers wiring the library together.
#[derive(Debug, thiserror::Error)]
pub enum AnimError {
    /// Free-form message, mostly surfaced by the application crate.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A settings file could not be parsed.
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    /// An easing preset name that is not part of the table.
    #[error("unknown easing curve `{0}`")]
    UnknownEase(String),
    /// A settings value outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: String,
    },
}

impl AnimError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid<T: Into<String>>(field: &'static str, reason: T) -> Self {
        Self::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}
