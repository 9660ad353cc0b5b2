use billpilot_types::ProcessorError;
use thiserror::Error;

/// Faults surfaced by the billing orchestrator.
///
/// The first three variants are raised locally, before any mutating remote
/// call. Anything the processor rejects arrives as [`BillingError::Processor`]
/// with the original remote error attached.
#[derive(Error, Debug)]
pub enum BillingError {
    /// Another customer already holds this email
    #[error("A customer with email '{0}' already exists")]
    DuplicateEmail(String),

    /// No customer matches the given id or email
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// The customer has no default payment source to charge
    #[error("Customer {0} has no default payment source")]
    NoPaymentSource(String),

    /// Any other processor failure
    #[error("Processor error: {0}")]
    Processor(#[from] ProcessorError),
}

impl BillingError {
    /// The underlying processor error, when this fault came from the processor
    pub fn processor_error(&self) -> Option<&ProcessorError> {
        match self {
            BillingError::Processor(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for orchestrator operations
pub type BillingResult<T> = std::result::Result<T, BillingError>;

/// Translate a processor failure on a call addressed to `customer_id`.
///
/// A missing resource blamed on the customer itself becomes
/// [`BillingError::CustomerNotFound`]; a missing resource blamed on another
/// parameter (a coupon code, a plan) stays a processor fault.
pub(crate) fn for_customer(customer_id: &str, err: ProcessorError) -> BillingError {
    let blames_customer = matches!(err.param.as_deref(), None | Some("id") | Some("customer"));
    if err.is_not_found() && blames_customer {
        BillingError::CustomerNotFound(customer_id.to_string())
    } else {
        BillingError::Processor(err)
    }
}

#[cfg(test)]
mod tests {
    use billpilot_types::ProcessorErrorKind;

    use super::*;

    #[test]
    fn test_missing_customer_becomes_customer_not_found() {
        let err = for_customer("cus_1", ProcessorError::not_found("customer", "cus_1"));
        assert!(matches!(err, BillingError::CustomerNotFound(id) if id == "cus_1"));

        let err = for_customer(
            "cus_1",
            ProcessorError::not_found("customer", "cus_1").with_param("id"),
        );
        assert!(matches!(err, BillingError::CustomerNotFound(_)));
    }

    #[test]
    fn test_missing_coupon_stays_processor_fault() {
        let err = for_customer(
            "cus_1",
            ProcessorError::not_found("coupon", "NOPE").with_param("coupon"),
        );
        let remote = err.processor_error().expect("processor fault");
        assert_eq!(remote.kind, ProcessorErrorKind::NotFound);
    }

    #[test]
    fn test_other_failures_stay_processor_faults() {
        let err = for_customer("cus_1", ProcessorError::transport("connection reset"));
        assert!(matches!(err, BillingError::Processor(_)));
    }
}
