use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad classification of a processor failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorErrorKind {
    /// The addressed resource does not exist
    NotFound,
    /// A charge against the payment source was declined
    CardDeclined,
    /// The processor rejected the request parameters
    InvalidRequest,
    /// Credentials were missing or rejected
    Authentication,
    /// Too many requests
    RateLimited,
    /// The processor could not be reached or answered garbage
    Transport,
    /// Any other processor-side failure
    Api,
}

impl fmt::Display for ProcessorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProcessorErrorKind::NotFound => "not found",
            ProcessorErrorKind::CardDeclined => "card declined",
            ProcessorErrorKind::InvalidRequest => "invalid request",
            ProcessorErrorKind::Authentication => "authentication failed",
            ProcessorErrorKind::RateLimited => "rate limited",
            ProcessorErrorKind::Transport => "transport error",
            ProcessorErrorKind::Api => "api error",
        };
        f.write_str(label)
    }
}

/// A failure reported by (or while reaching) the payment processor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ProcessorError {
    pub kind: ProcessorErrorKind,
    /// Processor-specific error code (e.g. `resource_missing`)
    pub code: Option<String>,
    pub message: String,
    /// Request parameter the processor blamed, if any
    pub param: Option<String>,
    pub http_status: Option<u16>,
}

impl ProcessorError {
    pub fn new(kind: ProcessorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            param: None,
            http_status: None,
        }
    }

    /// A missing resource, shaped like the processor's `resource_missing` error
    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new(
            ProcessorErrorKind::NotFound,
            format!("No such {}: '{}'", resource, id),
        )
        .with_code("resource_missing")
        .with_status(404)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorKind::InvalidRequest, message).with_status(400)
    }

    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorKind::CardDeclined, message)
            .with_code("card_declined")
            .with_status(402)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProcessorErrorKind::Transport, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ProcessorErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_shape() {
        let err = ProcessorError::not_found("customer", "cus_bogus").with_param("id");
        assert!(err.is_not_found());
        assert_eq!(err.code.as_deref(), Some("resource_missing"));
        assert_eq!(err.param.as_deref(), Some("id"));
        assert_eq!(err.http_status, Some(404));
        assert_eq!(err.to_string(), "not found: No such customer: 'cus_bogus'");
    }

    #[test]
    fn test_card_declined_is_not_not_found() {
        let err = ProcessorError::card_declined("Your card was declined.");
        assert!(!err.is_not_found());
        assert_eq!(err.kind, ProcessorErrorKind::CardDeclined);
        assert_eq!(err.http_status, Some(402));
    }
}
