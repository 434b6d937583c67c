use thiserror::Error;

/// Failures of the settlement flow and the roster operations around it.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("You are already registered for this event")]
    AlreadyRegistered,
    #[error("Event is full. No more registrations accepted.")]
    EventFull,
    #[error("Registration deadline has passed")]
    DeadlinePassed,
    #[error("Invalid payment signature")]
    InvalidSignature,
    #[error("Payment not completed (status: {0})")]
    PaymentNotCompleted(String),
    #[error("Payment provider error: {0}")]
    PaymentProviderError(String),
    #[error("Payment verification failed: {0}")]
    PaymentVerificationFailed(String),
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SettlementError {
    /// Short machine-readable tag used in replies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyRegistered => "already_registered",
            Self::EventFull => "event_full",
            Self::DeadlinePassed => "deadline_passed",
            Self::InvalidSignature => "invalid_signature",
            Self::PaymentNotCompleted(_) => "payment_not_completed",
            Self::PaymentProviderError(_) => "payment_provider_error",
            Self::PaymentVerificationFailed(_) => "payment_verification_failed",
            Self::PersistenceError(_) => "persistence_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::ValidationError(_) => "validation_error",
            Self::CsvError(_) => "csv_error",
            Self::IoError(_) => "io_error",
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for SettlementError {
    fn from(e: rocksdb::Error) -> Self {
        Self::PersistenceError(e.to_string())
    }
}

impl From<serde_json::Error> for SettlementError {
    fn from(e: serde_json::Error) -> Self {
        Self::PersistenceError(format!("Serialization error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, SettlementError>;
