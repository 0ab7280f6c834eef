//! Error classifier
//!
//! Turns an arbitrary [`RawFailure`] into a fully populated [`NormalizedError`].
//! Classification never fails: a fault inside the classifier itself is contained and
//! degrades to an `unknown` record carrying the input's best-effort text form.

pub mod raw;
pub mod shape;

pub use raw::{RawFailure, RuntimeFault};
pub use shape::{detect, BodyShape, RawFailureShape};

use crate::record::{ErrorKind, NormalizedError, DEFAULT_NETWORK_MESSAGE};
use crate::severity::SeverityPolicy;
use log::{debug, warn};
use serde_json::Value;
use shape::{field_text, is_truthy, sub_error_text, value_text};
use std::panic::{self, AssertUnwindSafe};

/// Separator used when joining the messages of several sub-errors
pub const JOIN_SEPARATOR: &str = ", ";

/// Classify a failure using the static severity table
pub fn classify(raw: &RawFailure, context: &str) -> NormalizedError {
    Classifier::default().classify(raw, context)
}

/// Kind, message and trace derived from a shape, before severity is attached
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub kind: ErrorKind,
    pub message: String,
    pub trace: String,
}

/// Stateless classifier parameterised by a severity policy
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    policy: SeverityPolicy,
}

impl Classifier {
    pub fn new(policy: SeverityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SeverityPolicy {
        &self.policy
    }

    /// Classify a raw failure into a normalized record
    ///
    /// # Arguments
    ///
    /// * `raw` - The failure value to inspect
    /// * `context` - Origin label copied into the record, may be empty
    pub fn classify(&self, raw: &RawFailure, context: &str) -> NormalizedError {
        self.contain(raw, context, |raw| normalize(&detect(raw)))
    }

    /// Run a normalization step, containing any panic it raises
    fn contain<F>(&self, raw: &RawFailure, context: &str, step: F) -> NormalizedError
    where
        F: FnOnce(&RawFailure) -> Classified,
    {
        let classified = match panic::catch_unwind(AssertUnwindSafe(|| step(raw))) {
            Ok(classified) => classified,
            Err(payload) => {
                let fault = RuntimeFault::from_panic(payload.as_ref());
                warn!(
                    "Classification faulted ({}), falling back to unknown",
                    fault.message
                );
                Classified {
                    kind: ErrorKind::Unknown,
                    message: raw.lossy_text(),
                    trace: String::new(),
                }
            }
        };

        let severity = self.policy.severity_for(&classified.kind);
        let record = NormalizedError::new(
            classified.kind,
            classified.message,
            classified.trace,
            severity,
            context,
        );

        debug!(
            "Classified failure: kind={} severity={} context='{}' message='{}'",
            record.kind, record.severity, record.context, record.message
        );
        record
    }
}

/// Derive kind, message and trace from a detected shape
pub fn normalize(shape: &RawFailureShape<'_>) -> Classified {
    match shape {
        RawFailureShape::RuntimeFault(fault) => Classified {
            kind: ErrorKind::RuntimeFault,
            message: fault.message.clone(),
            trace: fault.trace.clone(),
        },
        RawFailureShape::Backend {
            body,
            code,
            status,
            trace,
        } => {
            let kind = code
                .as_deref()
                .or(status.as_deref())
                .map(ErrorKind::from_code)
                .unwrap_or(ErrorKind::BackendError);

            let message = match body {
                BodyShape::List(items) | BodyShape::OutputErrors(items) => join_messages(items),
                BodyShape::Record(record) => field_text(record, "message")
                    .unwrap_or_else(|| serde_json::to_string(record).unwrap_or_default()),
                BodyShape::Text(text) => (*text).to_string(),
                BodyShape::Scalar(value) => value_text(value),
            };

            Classified {
                kind,
                message,
                trace: trace.clone().unwrap_or_default(),
            }
        }
        RawFailureShape::Aggregate(items) => Classified {
            kind: ErrorKind::Aggregate,
            message: join_messages(items),
            trace: String::new(),
        },
        RawFailureShape::Network { response, trace } => Classified {
            kind: ErrorKind::NetworkError,
            message: field_text(response, "statusText")
                .or_else(|| field_text(response, "data"))
                .unwrap_or_else(|| DEFAULT_NETWORK_MESSAGE.to_string()),
            trace: trace.clone().unwrap_or_default(),
        },
        RawFailureShape::Text(text) => Classified {
            kind: ErrorKind::StringError,
            message: (*text).to_string(),
            trace: String::new(),
        },
        RawFailureShape::MessageObject {
            message,
            trace,
            status,
        } => Classified {
            kind: object_kind(status.as_deref()),
            message: message.clone(),
            trace: trace.clone().unwrap_or_default(),
        },
        RawFailureShape::PlainObject { object, status } => Classified {
            kind: object_kind(status.as_deref()),
            message: serde_json::to_string(object).unwrap_or_default(),
            trace: String::new(),
        },
        RawFailureShape::Unrecognized(value) => Classified {
            kind: ErrorKind::Unknown,
            // Falsy input keeps the default text; other scalars keep their own
            message: if is_truthy(value) {
                value_text(value)
            } else {
                String::new()
            },
            trace: String::new(),
        },
    }
}

fn object_kind(status: Option<&str>) -> ErrorKind {
    status
        .map(ErrorKind::from_code)
        .unwrap_or(ErrorKind::ObjectError)
}

fn join_messages(items: &[Value]) -> String {
    items
        .iter()
        .map(sub_error_text)
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{
        Severity, DEFAULT_AGGREGATE_MESSAGE, DEFAULT_SERVER_MESSAGE, DEFAULT_UNKNOWN_MESSAGE,
    };
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use serde_json::json;

    fn classify_value(value: Value) -> NormalizedError {
        classify(&RawFailure::from(value), "")
    }

    #[test]
    fn test_null_is_unknown() {
        let record = classify(&RawFailure::null(), "");
        assert_eq!(record, NormalizedError::unknown(""));
        assert_eq!(record.message, DEFAULT_UNKNOWN_MESSAGE);
        assert_eq!(record.trace, "");
        assert_eq!(record.severity, Severity::Error);
    }

    #[test]
    fn test_falsy_scalars_are_unknown_with_default_text() {
        for value in [json!(""), json!(false), json!(0)] {
            let record = classify_value(value);
            assert_eq!(record.kind, ErrorKind::Unknown);
            assert_eq!(record.message, DEFAULT_UNKNOWN_MESSAGE);
        }
    }

    #[test]
    fn test_truthy_scalars_keep_their_text() {
        let record = classify_value(json!(404));
        assert_eq!(record.kind, ErrorKind::Unknown);
        assert_eq!(record.message, "404");
    }

    #[test]
    fn test_runtime_fault() {
        let raw = RawFailure::from(RuntimeFault::new("x is not defined", "at render (app.rs:3)"));
        let record = classify(&raw, "TestError");
        assert_eq!(record.kind, ErrorKind::RuntimeFault);
        assert_eq!(record.message, "x is not defined");
        assert_eq!(record.trace, "at render (app.rs:3)");
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.context, "TestError");
    }

    #[test]
    fn test_runtime_fault_from_error_value() {
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
        let record = classify(&RawFailure::from(error), "");
        assert_eq!(record.kind, ErrorKind::RuntimeFault);
        assert_eq!(record.message, "config.toml missing");
    }

    #[test]
    fn test_scenario_a_message_object() {
        let record = classify_value(json!({"message": "Network down"}));
        assert_eq!(record.kind, ErrorKind::ObjectError);
        assert_eq!(record.message, "Network down");
        assert_eq!(record.severity, Severity::Error);
    }

    #[test]
    fn test_scenario_b_output_errors() {
        let record = classify_value(json!({
            "body": {"output": {"errors": [
                {"message": "Field X required"},
                {"message": "Field Y invalid"}
            ]}}
        }));
        assert_eq!(record.message, "Field X required, Field Y invalid");
        assert_eq!(record.kind, ErrorKind::BackendError);
        assert_eq!(record.severity, Severity::Error);
    }

    #[test]
    fn test_scenario_b_prefers_error_code_then_status() {
        let with_code = classify_value(json!({
            "status": 400,
            "body": {
                "errorCode": "REQUIRED_FIELD_MISSING",
                "output": {"errors": [{"message": "Field X required"}]}
            }
        }));
        assert_eq!(
            with_code.kind,
            ErrorKind::Code("REQUIRED_FIELD_MISSING".to_string())
        );

        let with_status = classify_value(json!({
            "status": 400,
            "body": {"output": {"errors": [{"message": "Field X required"}]}}
        }));
        assert_eq!(with_status.kind, ErrorKind::Code("400".to_string()));
        assert_eq!(with_status.severity, Severity::Error);
    }

    #[test]
    fn test_scenario_c_plain_string() {
        let record = classify(&RawFailure::from("Simple string failure"), "");
        assert_eq!(record.kind, ErrorKind::StringError);
        assert_eq!(record.message, "Simple string failure");
        assert_eq!(record.severity, Severity::Info);
    }

    #[test]
    fn test_scenario_d_aggregate() {
        let record = classify_value(json!([{"message": "a"}, {"message": "b"}]));
        assert_eq!(record.kind, ErrorKind::Aggregate);
        assert_eq!(record.message, "a, b");
        assert_eq!(record.severity, Severity::Warning);
    }

    #[test]
    fn test_aggregate_stringifies_entries_without_message() {
        let record = classify_value(json!([{"message": "a"}, {"field": "Name"}]));
        assert_eq!(record.message, "a, {\"field\":\"Name\"}");
    }

    #[test]
    fn test_empty_aggregate_uses_default_message() {
        let record = classify_value(json!([]));
        assert_eq!(record.kind, ErrorKind::Aggregate);
        assert_eq!(record.message, DEFAULT_AGGREGATE_MESSAGE);
    }

    #[test]
    fn test_body_list() {
        let record = classify_value(json!({
            "body": [{"message": "Row 1 locked"}, {"message": "Row 2 locked"}]
        }));
        assert_eq!(record.kind, ErrorKind::BackendError);
        assert_eq!(record.message, "Row 1 locked, Row 2 locked");
        assert_eq!(record.severity, Severity::Error);

        let with_status = classify_value(json!({
            "status": 500,
            "body": [{"message": "Row 1 locked"}]
        }));
        assert_eq!(with_status.kind, ErrorKind::Code("500".to_string()));
    }

    #[test]
    fn test_body_record_with_message_and_trace() {
        let record = classify_value(json!({
            "status": 500,
            "body": {
                "message": "Script-thrown exception",
                "stackTrace": "Class.AccountController.load: line 12",
                "exceptionType": "System.QueryException"
            }
        }));
        assert_eq!(record.kind, ErrorKind::Code("500".to_string()));
        assert_eq!(record.message, "Script-thrown exception");
        assert_eq!(record.trace, "Class.AccountController.load: line 12");
    }

    #[test]
    fn test_body_record_without_message_is_stringified() {
        let record = classify_value(json!({"body": {"detail": "nope"}}));
        assert_eq!(record.kind, ErrorKind::BackendError);
        assert_eq!(record.message, "{\"detail\":\"nope\"}");
    }

    #[test]
    fn test_body_string() {
        let record = classify_value(json!({"body": "Gateway exploded"}));
        assert_eq!(record.kind, ErrorKind::BackendError);
        assert_eq!(record.message, "Gateway exploded");
    }

    #[test]
    fn test_backend_code_naming_builtin_kind_uses_its_severity() {
        let record = classify_value(json!({
            "body": {"errorCode": "string_error", "message": "heads up"}
        }));
        assert_eq!(record.kind, ErrorKind::StringError);
        assert_eq!(record.severity, Severity::Info);
    }

    #[test]
    fn test_network_response() {
        let record = classify(
            &RawFailure::from_response(503, "Service Unavailable", Value::Null),
            "",
        );
        assert_eq!(record.kind, ErrorKind::NetworkError);
        assert_eq!(record.message, "Service Unavailable");
        assert_eq!(record.severity, Severity::Error);
    }

    #[test]
    fn test_network_response_falls_back_to_data_then_default() {
        let record = classify_value(json!({"response": {"status": 502, "data": "bad gateway"}}));
        assert_eq!(record.message, "bad gateway");

        let record = classify_value(json!({"response": {"status": 502, "data": {"e": 1}}}));
        assert_eq!(record.message, "{\"e\":1}");

        let record = classify_value(json!({"response": {"status": 502}, "stack": "fetch.rs:1"}));
        assert_eq!(record.message, DEFAULT_NETWORK_MESSAGE);
        assert_eq!(record.trace, "fetch.rs:1");
    }

    #[test]
    fn test_message_object_with_status_and_trace() {
        let record = classify_value(json!({
            "message": "Forbidden",
            "status": "FORBIDDEN",
            "stack": "handler.rs:9"
        }));
        assert_eq!(record.kind, ErrorKind::Code("FORBIDDEN".to_string()));
        assert_eq!(record.message, "Forbidden");
        assert_eq!(record.trace, "handler.rs:9");
    }

    #[test]
    fn test_plain_object() {
        let record = classify_value(json!({"code": 7}));
        assert_eq!(record.kind, ErrorKind::ObjectError);
        assert_eq!(record.message, "{\"code\":7}");

        let record = classify_value(json!({}));
        assert_eq!(record.kind, ErrorKind::ObjectError);
        assert_eq!(record.message, "{}");
    }

    #[test]
    fn test_classifier_uses_policy_overrides() {
        let classifier = Classifier::new(SeverityPolicy::new().with_override("400", Severity::Warning));
        let record = classifier.classify(
            &RawFailure::from(json!({"status": 400, "body": "bad request"})),
            "",
        );
        assert_eq!(record.severity, Severity::Warning);
    }

    #[test]
    fn test_faulting_normalization_degrades_to_unknown() {
        let classifier = Classifier::default();
        let raw = RawFailure::from(json!({"message": "original"}));

        let record = classifier.contain(&raw, "Widget", |_| panic!("normalizer bug"));

        assert_eq!(record.kind, ErrorKind::Unknown);
        assert_eq!(record.message, "{\"message\":\"original\"}");
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.context, "Widget");
    }

    #[test]
    fn test_faulting_normalization_on_null_keeps_default_text() {
        let record = Classifier::default().contain(&RawFailure::null(), "", |_| panic!("bug"));
        assert_eq!(record, NormalizedError::unknown(""));
    }

    #[test]
    fn test_body_with_empty_message_is_stringified() {
        let record = classify_value(json!({"body": {"message": ""}}));
        assert_eq!(record.message, "{\"message\":\"\"}");

        let record = NormalizedError::new(
            ErrorKind::BackendError,
            "",
            "",
            Severity::Error,
            "",
        );
        assert_eq!(record.message, DEFAULT_SERVER_MESSAGE);
    }

    /// Failure values spanning every recognized shape
    #[derive(Debug, Clone)]
    struct AnyFailure(RawFailure);

    impl Arbitrary for AnyFailure {
        fn arbitrary(g: &mut Gen) -> Self {
            let text = String::arbitrary(g);
            let status = u16::arbitrary(g);
            let raw = match u8::arbitrary(g) % 9 {
                0 => RawFailure::from(RuntimeFault::new(text, String::arbitrary(g))),
                1 => RawFailure::from(json!({"body": {"message": text}, "status": status})),
                2 => RawFailure::from(json!({"body": [{"message": text}]})),
                3 => RawFailure::from(json!([{"message": text}, {"other": status}])),
                4 => RawFailure::from(json!({"response": {"status": status, "statusText": text}})),
                5 => RawFailure::from(text),
                6 => RawFailure::from(json!({"message": text})),
                7 => RawFailure::from(json!({"status": text})),
                _ => RawFailure::null(),
            };
            AnyFailure(raw)
        }
    }

    #[quickcheck]
    fn prop_message_never_empty(failure: AnyFailure) -> bool {
        !classify(&failure.0, "").message.trim().is_empty()
    }

    #[quickcheck]
    fn prop_classification_is_idempotent(failure: AnyFailure, context: String) -> bool {
        classify(&failure.0, &context) == classify(&failure.0, &context)
    }

    #[quickcheck]
    fn prop_context_is_copied(failure: AnyFailure, context: String) -> bool {
        classify(&failure.0, &context).context == context
    }
}
