use matterdesk::AutomationError;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum OpStatus {
    Success,
    Cancelled,
    Unavailable,
}

/// JSON written to stdout for a completed operation
#[derive(Debug, Clone, Serialize)]
pub struct OpResult {
    pub status: OpStatus,
    pub message: String,
    /// Operation-specific fields, flattened next to `status` and `message`
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl OpResult {
    pub fn new(status: OpStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: Map::new(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(OpStatus::Success, message)
    }

    /// Adds the fields of a serializable report; non-object values land under `data`.
    pub fn with(mut self, report: impl Serialize) -> Self {
        match serde_json::to_value(report) {
            Ok(Value::Object(fields)) => {
                for (key, value) in fields {
                    if key != "message" {
                        self.data.insert(key, value);
                    }
                }
            }
            Ok(Value::Null) => {}
            Ok(other) => {
                self.data.insert("data".to_string(), other);
            }
            Err(e) => {
                self.data
                    .insert("serialization_error".to_string(), Value::String(e.to_string()));
            }
        }
        self
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// `{"error": ...}` body for a failed operation
pub fn error_body(error: &anyhow::Error) -> Value {
    serde_json::json!({ "error": format!("{error:#}") })
}

/// False when the library already showed the user why the operation stopped.
pub fn needs_notice(error: &anyhow::Error) -> bool {
    !error.chain().any(|cause| {
        cause
            .downcast_ref::<AutomationError>()
            .is_some_and(AutomationError::already_notified)
    })
}
