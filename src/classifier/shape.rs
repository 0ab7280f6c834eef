//! Shape detection for raw failures
//!
//! Raw failures overlap in shape (a backend failure is also an object with a
//! `status`, a network failure also carries a `message`), so detection runs an
//! ordered list of detectors and the first match wins. Each detector yields one
//! variant of [`RawFailureShape`]; turning a shape into a record happens elsewhere.

use super::raw::{RawFailure, RuntimeFault};
use serde_json::{Map, Value};

/// Field carrying a backend-supplied error code inside a failure body
pub const CODE_FIELD: &str = "errorCode";

/// Field carrying a status on the failure object or its response
pub const STATUS_FIELD: &str = "status";

/// Fields that may carry trace text, in lookup order
pub const TRACE_FIELDS: &[&str] = &["stack", "stackTrace", "trace"];

/// Closed set of failure shapes the classifier understands
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailureShape<'a> {
    /// Native runtime fault
    RuntimeFault(&'a RuntimeFault),
    /// Object wrapping a structured backend `body`
    Backend {
        body: BodyShape<'a>,
        code: Option<String>,
        status: Option<String>,
        trace: Option<String>,
    },
    /// Bare list of sub-errors
    Aggregate(&'a [Value]),
    /// Object whose `response` carries a status code
    Network {
        response: &'a Map<String, Value>,
        trace: Option<String>,
    },
    /// Plain string
    Text(&'a str),
    /// Generic object with a `message`
    MessageObject {
        message: String,
        trace: Option<String>,
        status: Option<String>,
    },
    /// Generic object without a `message`
    PlainObject {
        object: &'a Map<String, Value>,
        status: Option<String>,
    },
    /// Absent, empty or scalar input
    Unrecognized(&'a Value),
}

/// Shapes a backend `body` can take
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape<'a> {
    /// List of sub-errors
    List(&'a [Value]),
    /// Record with non-empty `output.errors`
    OutputErrors(&'a [Value]),
    /// Any other record
    Record(&'a Map<String, Value>),
    /// String payload
    Text(&'a str),
    /// Number or boolean payload
    Scalar(&'a Value),
}

/// A shape detector: claims the failure or passes
pub type Detector = fn(&RawFailure) -> Option<RawFailureShape<'_>>;

/// Detectors in priority order
pub const DETECTORS: &[(&str, Detector)] = &[
    ("runtime_fault", detect_runtime_fault as Detector),
    ("backend_body", detect_backend_body as Detector),
    ("aggregate", detect_aggregate as Detector),
    ("network_response", detect_network_response as Detector),
    ("text", detect_text as Detector),
    ("message_object", detect_message_object as Detector),
    ("plain_object", detect_plain_object as Detector),
];

/// Run the detectors in order and return the first matching shape
pub fn detect(raw: &RawFailure) -> RawFailureShape<'_> {
    for (_, detector) in DETECTORS {
        if let Some(shape) = detector(raw) {
            return shape;
        }
    }

    match raw {
        RawFailure::Payload(value) => RawFailureShape::Unrecognized(value),
        // Faults are always claimed by the first detector
        RawFailure::Fault(fault) => RawFailureShape::RuntimeFault(fault),
    }
}

/// Truthiness as the failure producers understand it: null, false, zero and the
/// empty string count as absent
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a field value: strings verbatim, everything else as JSON
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Read a truthy field as text
pub fn field_text(object: &Map<String, Value>, field: &str) -> Option<String> {
    object
        .get(field)
        .filter(|value| is_truthy(value))
        .map(value_text)
}

/// First truthy trace field of an object
pub fn trace_of(object: &Map<String, Value>) -> Option<String> {
    TRACE_FIELDS
        .iter()
        .find_map(|field| field_text(object, field))
}

/// Message of a sub-error, or its JSON form when it has none
pub fn sub_error_text(value: &Value) -> String {
    value
        .as_object()
        .and_then(|object| field_text(object, "message"))
        .unwrap_or_else(|| value.to_string())
}

fn payload_object(raw: &RawFailure) -> Option<&Map<String, Value>> {
    match raw {
        RawFailure::Payload(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn detect_runtime_fault(raw: &RawFailure) -> Option<RawFailureShape<'_>> {
    match raw {
        RawFailure::Fault(fault) => Some(RawFailureShape::RuntimeFault(fault)),
        RawFailure::Payload(_) => None,
    }
}

fn detect_backend_body(raw: &RawFailure) -> Option<RawFailureShape<'_>> {
    let object = payload_object(raw)?;
    let body = object.get("body").filter(|body| is_truthy(body))?;

    let body_shape = match body {
        Value::Array(items) => BodyShape::List(items),
        Value::Object(record) => match output_errors(record) {
            Some(errors) => BodyShape::OutputErrors(errors),
            None => BodyShape::Record(record),
        },
        Value::String(text) => BodyShape::Text(text),
        scalar => BodyShape::Scalar(scalar),
    };

    let (code, trace) = match body.as_object() {
        Some(record) => (field_text(record, CODE_FIELD), trace_of(record)),
        None => (None, None),
    };

    Some(RawFailureShape::Backend {
        body: body_shape,
        code,
        status: field_text(object, STATUS_FIELD),
        trace,
    })
}

fn output_errors(record: &Map<String, Value>) -> Option<&[Value]> {
    record
        .get("output")
        .and_then(|output| output.get("errors"))
        .and_then(Value::as_array)
        .filter(|errors| !errors.is_empty())
        .map(Vec::as_slice)
}

fn detect_aggregate(raw: &RawFailure) -> Option<RawFailureShape<'_>> {
    match raw {
        RawFailure::Payload(Value::Array(items)) => Some(RawFailureShape::Aggregate(items)),
        _ => None,
    }
}

fn detect_network_response(raw: &RawFailure) -> Option<RawFailureShape<'_>> {
    let object = payload_object(raw)?;
    let response = object.get("response")?.as_object()?;
    if !response.get(STATUS_FIELD).map(is_truthy).unwrap_or(false) {
        return None;
    }

    Some(RawFailureShape::Network {
        response,
        trace: trace_of(object),
    })
}

fn detect_text(raw: &RawFailure) -> Option<RawFailureShape<'_>> {
    match raw {
        RawFailure::Payload(Value::String(text)) if !text.is_empty() => {
            Some(RawFailureShape::Text(text))
        }
        _ => None,
    }
}

fn detect_message_object(raw: &RawFailure) -> Option<RawFailureShape<'_>> {
    let object = payload_object(raw)?;
    let message = field_text(object, "message")?;

    Some(RawFailureShape::MessageObject {
        message,
        trace: trace_of(object),
        status: field_text(object, STATUS_FIELD),
    })
}

fn detect_plain_object(raw: &RawFailure) -> Option<RawFailureShape<'_>> {
    let object = payload_object(raw)?;

    Some(RawFailureShape::PlainObject {
        object,
        status: field_text(object, STATUS_FIELD),
    })
}
