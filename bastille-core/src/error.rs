use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event bus error: {0}")]
    BusError(String),

    #[error("Event handler error: {0}")]
    HandlerError(String),
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Signature mismatch")]
    InvalidSignature,

    #[error("Capability link expired")]
    Expired,

    #[error("Malformed capability: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification channel unavailable: {0}")]
    ChannelUnavailable(String),
}

impl Error {
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_cache_error(&self) -> bool {
        matches!(self, Error::Cache(_))
    }

    pub fn is_capability_error(&self) -> bool {
        matches!(self, Error::Capability(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");

        let cache_error = Error::Cache(CacheError::Backend("unreachable".to_string()));
        assert_eq!(
            cache_error.to_string(),
            "Cache error: Cache backend error: unreachable"
        );

        let capability_error = Error::Capability(CapabilityError::Expired);
        assert_eq!(
            capability_error.to_string(),
            "Capability error: Capability link expired"
        );
    }

    #[test]
    fn test_error_from_conversions() {
        let error: Error = StorageError::NotFound.into();
        assert!(matches!(error, Error::Storage(StorageError::NotFound)));
        assert!(error.is_storage_error());

        let error: Error = CacheError::Backend("down".to_string()).into();
        assert!(error.is_cache_error());

        let error: Error = CapabilityError::InvalidSignature.into();
        assert!(error.is_capability_error());
    }

    #[test]
    fn test_validation_error_variants() {
        let invalid_email = ValidationError::InvalidEmail("bad@".to_string());
        assert_eq!(invalid_email.to_string(), "Invalid email format: bad@");

        let missing_field = ValidationError::MissingField("identifier".to_string());
        assert_eq!(
            missing_field.to_string(),
            "Missing required field: identifier"
        );
    }
}
