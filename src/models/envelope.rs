use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response wrapper returned by the gateway for every action.
///
/// `content_type` and `preview` are only set when the relay had to wrap a
/// non-JSON upstream body.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Envelope {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub preview: Option<String>,
}

impl Envelope {
    pub fn success(result: Value) -> Self {
        Envelope {
            ok: true,
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Envelope {
            ok: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_wrapped_non_json(&self) -> bool {
        !self.ok && (self.content_type.is_some() || self.preview.is_some())
    }
}
