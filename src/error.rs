use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenewalError {
    /// The target period already holds a recipient record for this
    /// student + scholarship pair. Non-fatal, surfaced per item.
    #[error("recipient already exists for {student} / {scholarship} in {period}")]
    DuplicateRenewal {
        student: String,
        scholarship: String,
        period: String,
    },

    #[error("invalid academic period: {0:?}")]
    InvalidPeriod(String),

    #[error("unrecognized status value: {0:?}")]
    InvalidStatus(String),

    #[error("renewal status cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("storage error")]
    Storage(#[from] sqlx::Error),
}

impl RenewalError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RenewalError::DuplicateRenewal { .. })
    }
}
