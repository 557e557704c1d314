use {
    thiserror::Error,
    tally_store::StorageError,
};

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum CounterError {
    #[error("configuration error: {reason}")]
    ConfigurationError { reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("counter record {id} not found")]
    RecordNotFound { id: i64 },

    #[error("counter record has no {attribute:?} attribute")]
    AttributeMissing { attribute: String },

    #[error("counter value is not a non-negative integer: {value}")]
    InvalidCounterValue { value: String },

    #[error("counter overflow")]
    CounterOverflow,

    #[error("serialization error: {reason}")]
    SerializationError { reason: String },
}
