use billpilot_types::{ProcessorError, ProcessorErrorKind};
use convert_case::{Case, Casing};
use serde::Deserialize;
use stripe::StripeError;

/// Error envelope returned by the REST API: `{"error": {...}}`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

fn kind_for(status: u16, code: Option<&str>) -> ProcessorErrorKind {
    match (status, code) {
        (_, Some("resource_missing")) | (404, _) => ProcessorErrorKind::NotFound,
        (_, Some("card_declined")) | (402, _) => ProcessorErrorKind::CardDeclined,
        (401, _) => ProcessorErrorKind::Authentication,
        (429, _) => ProcessorErrorKind::RateLimited,
        (400, _) => ProcessorErrorKind::InvalidRequest,
        _ => ProcessorErrorKind::Api,
    }
}

/// Translate an error raised by the typed client
pub fn from_stripe_error(err: StripeError) -> ProcessorError {
    match err {
        StripeError::Stripe(request) => {
            let code = request
                .code
                .map(|code| format!("{:?}", code).to_case(Case::Snake));
            let message = request
                .message
                .unwrap_or_else(|| format!("request failed with status {}", request.http_status));
            ProcessorError {
                kind: kind_for(request.http_status, code.as_deref()),
                code,
                message,
                param: None,
                http_status: Some(request.http_status),
            }
        }
        other => ProcessorError::transport(other.to_string()),
    }
}

/// Translate a non-success HTTP answer from a raw request
pub fn from_error_body(status: u16, body: &str) -> ProcessorError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error }) => {
            let message = error
                .message
                .or(error.error_type)
                .unwrap_or_else(|| format!("request failed with status {}", status));
            ProcessorError {
                kind: kind_for(status, error.code.as_deref()),
                code: error.code,
                message,
                param: error.param,
                http_status: Some(status),
            }
        }
        Err(_) => ProcessorError::new(
            kind_for(status, None),
            format!("request failed with status {}: {}", status, body),
        )
        .with_status(status),
    }
}

pub fn from_reqwest_error(err: reqwest::Error) -> ProcessorError {
    let error = ProcessorError::transport(err.to_string());
    match err.status() {
        Some(status) => error.with_status(status.as_u16()),
        None => error,
    }
}

/// An id that cannot name a real object is reported like a missing one
pub fn malformed_id(resource: &str, id: &str) -> ProcessorError {
    ProcessorError::not_found(resource, id).with_param("id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_coupon_body() {
        let body = r#"{
            "error": {
                "code": "resource_missing",
                "doc_url": "https://stripe.com/docs/error-codes/resource-missing",
                "message": "No such coupon: 'NOPE'",
                "param": "coupon",
                "type": "invalid_request_error"
            }
        }"#;
        let err = from_error_body(400, body);
        assert_eq!(err.kind, ProcessorErrorKind::NotFound);
        assert_eq!(err.code.as_deref(), Some("resource_missing"));
        assert_eq!(err.param.as_deref(), Some("coupon"));
        assert_eq!(err.message, "No such coupon: 'NOPE'");
        assert_eq!(err.http_status, Some(400));
    }

    #[test]
    fn test_typed_error_keeps_param() {
        let mut request: stripe::RequestError = serde_json::from_str(
            r#"{
                "type": "invalid_request_error",
                "code": "resource_missing",
                "message": "No such coupon: 'NOPE'",
                "param": "coupon"
            }"#,
        )
        .unwrap();
        request.http_status = 400;

        let err = from_stripe_error(StripeError::Stripe(request));
        assert_eq!(err.kind, ProcessorErrorKind::NotFound);
        assert_eq!(err.code.as_deref(), Some("resource_missing"));
        assert_eq!(err.param.as_deref(), Some("coupon"));
        assert_eq!(err.http_status, Some(400));
    }

    #[test]
    fn test_card_declined_body() {
        let body = r#"{"error": {"code": "card_declined", "message": "Your card was declined.", "type": "card_error"}}"#;
        let err = from_error_body(402, body);
        assert_eq!(err.kind, ProcessorErrorKind::CardDeclined);
        assert_eq!(err.code.as_deref(), Some("card_declined"));
    }

    #[test]
    fn test_status_only_classification() {
        assert_eq!(from_error_body(401, "{}").kind, ProcessorErrorKind::Authentication);
        assert_eq!(from_error_body(429, "slow down").kind, ProcessorErrorKind::RateLimited);
        assert_eq!(from_error_body(500, "oops").kind, ProcessorErrorKind::Api);
        assert_eq!(from_error_body(404, "").kind, ProcessorErrorKind::NotFound);
    }

    #[test]
    fn test_unparseable_body_is_kept_in_message() {
        let err = from_error_body(502, "<html>bad gateway</html>");
        assert!(err.message.contains("bad gateway"));
        assert_eq!(err.http_status, Some(502));
    }

    #[test]
    fn test_malformed_id_reads_as_missing_customer() {
        let err = malformed_id("customer", "not-an-id");
        assert!(err.is_not_found());
        assert_eq!(err.param.as_deref(), Some("id"));
    }
}
