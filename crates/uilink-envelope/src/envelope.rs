use serde_json::Value;

use crate::error::{EnvelopeError, Result};

/// Namespace reserved for the message channel's own calls and replies.
pub const UI_NAMESPACE: &str = "UI";

/// One message exchanged over a transport.
///
/// Wire format: a single JSON array per frame.
/// ```text
/// ┌─────────────┬─────────────┬──────────────────────┐
/// │ namespace   │ method      │ args                 │
/// │ "UI"        │ "getWidth"  │ (zero or more)       │
/// └─────────────┴─────────────┴──────────────────────┘
/// ```
/// Namespace and method are always present. The same shape serves as a call,
/// a reply, and an unsolicited event; receivers disambiguate by whether a
/// waiter is registered for the method.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Logical channel this message belongs to.
    pub namespace: String,
    /// Method being called or replied to.
    pub method: String,
    /// Positional arguments, transport-serializable values only.
    pub args: Vec<Value>,
}

impl Envelope {
    /// Create a new envelope.
    pub fn new(
        namespace: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            method: method.into(),
            args,
        }
    }

    /// Create an envelope in the reserved `"UI"` namespace.
    pub fn ui(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(UI_NAMESPACE, method, args)
    }

    /// True when this envelope belongs to the given session namespace.
    pub fn is_namespace(&self, namespace: &str) -> bool {
        self.namespace == namespace
    }

    /// Decode an envelope from an already-parsed value array.
    pub fn from_values(mut values: Vec<Value>) -> Result<Self> {
        if values.is_empty() {
            return Err(EnvelopeError::MissingNamespace);
        }
        if values.len() < 2 {
            return Err(EnvelopeError::MissingMethod);
        }

        let rest = values.split_off(2);
        let mut head = values.into_iter();

        let namespace = match head.next() {
            Some(Value::String(s)) => s,
            _ => return Err(EnvelopeError::MissingNamespace),
        };
        let method = match head.next() {
            Some(Value::String(s)) => s,
            _ => return Err(EnvelopeError::MissingMethod),
        };

        Ok(Self {
            namespace,
            method,
            args: rest,
        })
    }

    /// Consume the envelope and return the ordered value array.
    pub fn into_values(self) -> Vec<Value> {
        let mut values = Vec::with_capacity(2 + self.args.len());
        values.push(Value::String(self.namespace));
        values.push(Value::String(self.method));
        values.extend(self.args);
        values
    }

    /// The ordered value array, cloned.
    pub fn to_values(&self) -> Vec<Value> {
        self.clone().into_values()
    }

    /// Encode this envelope as one self-delimited JSON text frame.
    pub fn to_json(&self) -> String {
        Value::Array(self.to_values()).to_string()
    }

    /// Decode an envelope from one JSON text frame.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Array(values) => Self::from_values(values),
            _ => Err(EnvelopeError::NotAnArray),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let envelope = Envelope::ui("setSize", vec![json!(640), json!(480)]);
        let text = envelope.to_json();

        assert_eq!(text, r#"["UI","setSize",640,480]"#);

        let decoded = Envelope::from_json(&text).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn decode_no_args() {
        let envelope = Envelope::from_json(r#"["UI","getWidth"]"#).unwrap();
        assert_eq!(envelope.namespace, "UI");
        assert_eq!(envelope.method, "getWidth");
        assert!(envelope.args.is_empty());
    }

    #[test]
    fn decode_foreign_namespace() {
        let envelope = Envelope::from_json(r#"["custom","tick",1,2.5,"x"]"#).unwrap();
        assert!(!envelope.is_namespace(UI_NAMESPACE));
        assert_eq!(envelope.args, vec![json!(1), json!(2.5), json!("x")]);
    }

    #[test]
    fn decode_rejects_non_array() {
        let err = Envelope::from_json(r#"{"method":"getWidth"}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::NotAnArray));
    }

    #[test]
    fn decode_rejects_missing_method() {
        let err = Envelope::from_json(r#"["UI"]"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingMethod));
    }

    #[test]
    fn decode_rejects_non_string_head() {
        let err = Envelope::from_json(r#"[42,"getWidth"]"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingNamespace));

        let err = Envelope::from_json(r#"["UI",42]"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingMethod));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = Envelope::from_json("not json").unwrap_err();
        assert!(matches!(err, EnvelopeError::Json(_)));
    }

    #[test]
    fn values_roundtrip_preserves_order() {
        let values = vec![json!("UI"), json!("sendNote"), json!(0), json!(60), json!(127)];
        let envelope = Envelope::from_values(values.clone()).unwrap();
        assert_eq!(envelope.into_values(), values);
    }
}
