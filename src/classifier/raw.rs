use serde_json::{json, Value};
use std::any::Any;
use std::error::Error as StdError;

/// A local runtime fault: a Rust error value or a caught panic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFault {
    pub message: String,
    pub trace: String,
}

impl RuntimeFault {
    pub fn new(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: trace.into(),
        }
    }

    /// Capture an error value, recording its source chain as the trace
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        let mut trace = String::new();
        let mut source = error.source();
        while let Some(cause) = source {
            if !trace.is_empty() {
                trace.push('\n');
            }
            trace.push_str("caused by: ");
            trace.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::new(error.to_string(), trace)
    }

    /// Capture a panic payload as returned by `std::panic::catch_unwind`
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "panic with non-string payload".to_string()
        };

        Self::new(message, "")
    }
}

/// An arbitrary failure value handed to the pipeline
///
/// Only the classifier looks inside. Backend and network failures arrive as
/// structured payloads; local faults as [`RuntimeFault`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    Fault(RuntimeFault),
    Payload(Value),
}

impl RawFailure {
    /// Capture any error value as a runtime fault
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        RawFailure::Fault(RuntimeFault::from_error(error))
    }

    /// Capture a panic payload as a runtime fault
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        RawFailure::Fault(RuntimeFault::from_panic(payload))
    }

    /// Describe a non-success HTTP response in the network-response shape
    pub fn from_response(status: u16, status_text: &str, data: Value) -> Self {
        RawFailure::Payload(json!({
            "response": {
                "status": status,
                "statusText": status_text,
                "data": data,
            },
            "message": format!("HTTP {}: {}", status, status_text),
        }))
    }

    /// Absent input
    pub fn null() -> Self {
        RawFailure::Payload(Value::Null)
    }

    /// Best-effort text form of the input, used when classification itself faults
    pub fn lossy_text(&self) -> String {
        match self {
            RawFailure::Fault(fault) => fault.message.clone(),
            RawFailure::Payload(Value::String(text)) => text.clone(),
            RawFailure::Payload(Value::Null) => String::new(),
            RawFailure::Payload(value) => value.to_string(),
        }
    }
}

impl From<Value> for RawFailure {
    fn from(value: Value) -> Self {
        RawFailure::Payload(value)
    }
}

impl From<&str> for RawFailure {
    fn from(text: &str) -> Self {
        RawFailure::Payload(Value::String(text.to_string()))
    }
}

impl From<String> for RawFailure {
    fn from(text: String) -> Self {
        RawFailure::Payload(Value::String(text))
    }
}

impl From<RuntimeFault> for RawFailure {
    fn from(fault: RuntimeFault) -> Self {
        RawFailure::Fault(fault)
    }
}

impl From<anyhow::Error> for RawFailure {
    fn from(error: anyhow::Error) -> Self {
        let trace = error
            .chain()
            .skip(1)
            .map(|cause| format!("caused by: {}", cause))
            .collect::<Vec<_>>()
            .join("\n");
        RawFailure::Fault(RuntimeFault::new(error.to_string(), trace))
    }
}

impl From<std::io::Error> for RawFailure {
    fn from(error: std::io::Error) -> Self {
        RawFailure::from_error(&error)
    }
}

impl From<reqwest::Error> for RawFailure {
    fn from(error: reqwest::Error) -> Self {
        RawFailure::from_error(&error)
    }
}

impl<T: Into<RawFailure>> From<Option<T>> for RawFailure {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(RawFailure::null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "query failed")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_fault_from_error_records_source_chain() {
        let error = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        let fault = RuntimeFault::from_error(&error);
        assert_eq!(fault.message, "query failed");
        assert_eq!(fault.trace, "caused by: connection refused");
    }

    #[test]
    fn test_fault_from_panic_payloads() {
        let static_payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        assert_eq!(
            RuntimeFault::from_panic(static_payload.as_ref()).message,
            "index out of bounds"
        );

        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("bad state"));
        assert_eq!(
            RuntimeFault::from_panic(owned_payload.as_ref()).message,
            "bad state"
        );

        let opaque_payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(
            RuntimeFault::from_panic(opaque_payload.as_ref()).message,
            "panic with non-string payload"
        );
    }

    #[test]
    fn test_from_response_shape() {
        let raw = RawFailure::from_response(503, "Service Unavailable", Value::Null);
        let RawFailure::Payload(value) = raw else {
            panic!("expected payload");
        };
        assert_eq!(value["response"]["status"], 503);
        assert_eq!(value["response"]["statusText"], "Service Unavailable");
        assert_eq!(value["message"], "HTTP 503: Service Unavailable");
    }

    #[test]
    fn test_from_anyhow_keeps_context_chain() {
        let error = anyhow::anyhow!("disk full").context("saving draft");
        let raw = RawFailure::from(error);
        assert_eq!(
            raw,
            RawFailure::Fault(RuntimeFault::new("saving draft", "caused by: disk full"))
        );
    }

    #[test]
    fn test_option_conversion() {
        let none: Option<&str> = None;
        assert_eq!(RawFailure::from(none), RawFailure::null());
        assert_eq!(
            RawFailure::from(Some("oops")),
            RawFailure::Payload(Value::String("oops".to_string()))
        );
    }

    #[test]
    fn test_lossy_text() {
        assert_eq!(RawFailure::from("plain").lossy_text(), "plain");
        assert_eq!(RawFailure::null().lossy_text(), "");
        assert_eq!(RawFailure::from(json!({"a": 1})).lossy_text(), "{\"a\":1}");
    }
}
