use thiserror::Error;

/// Errors raised when input crossing into the calendar core is malformed.
///
/// Every variant is reported before any state changes: a rejected
/// transition leaves the calendar exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid date input '{input}': {reason}")]
    InvalidDateInput { input: String, reason: String },

    #[error("unknown week start day: {0}")]
    InvalidWeekStart(String),

    #[error("unknown timezone id: {0}")]
    InvalidTimezone(String),
}

impl CalendarError {
    pub(crate) fn invalid_date(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDateInput {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CalendarResult<T> = Result<T, CalendarError>;
