use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::constants::{GATEWAY_URL_PREFIX, PREVIEW_LEN};
use crate::error::{ConsoleError, ConsoleResult};
use crate::logging::log_debug;
use crate::models::Envelope;

#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: u16,
    pub envelope: Envelope,
}

/// Forwards one JSON payload to the gateway web app and hands back its envelope.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn forward(&self, target_url: &str, payload: Value) -> ConsoleResult<RelayResponse>;
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    #[serde(rename = "gasUrl")]
    gas_url: &'a str,
    payload: &'a Value,
}

/// Talks to the HTTP forwarding relay.
pub struct HttpRelay {
    client: reqwest::Client,
    relay_url: String,
}

impl HttpRelay {
    pub fn new(relay_url: impl Into<String>, timeout: Duration) -> ConsoleResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConsoleError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            relay_url: relay_url.into(),
        })
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }
}

#[async_trait]
impl RelayTransport for HttpRelay {
    async fn forward(&self, target_url: &str, payload: Value) -> ConsoleResult<RelayResponse> {
        let request = RelayRequest {
            gas_url: target_url,
            payload: &payload,
        };

        let response = self
            .client
            .post(&self.relay_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ConsoleError::Transport(format!("POST {} failed: {}", self.relay_url, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let text = response
            .text()
            .await
            .map_err(|e| ConsoleError::Transport(format!("Failed to read relay response: {}", e)))?;

        log_debug(&format!("relay answered {} ({}, {} bytes)", status, content_type, text.len()));

        let envelope = parse_envelope(status, &content_type, &text)?;
        Ok(RelayResponse { status, envelope })
    }
}

/// Decodes a relay body, turning HTML or other non-JSON content into
/// `UpstreamFormat` whether the relay wrapped it or passed it through.
pub fn parse_envelope(status: u16, content_type: &str, text: &str) -> ConsoleResult<Envelope> {
    let envelope: Envelope = match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value)?,
        _ => {
            return Err(ConsoleError::UpstreamFormat {
                status,
                content_type: content_type.to_string(),
                preview: preview(text),
            })
        }
    };

    if envelope.is_wrapped_non_json() {
        return Err(ConsoleError::UpstreamFormat {
            status: envelope.status.unwrap_or(status),
            content_type: envelope.content_type.clone().unwrap_or_else(|| "unknown".to_string()),
            preview: envelope.preview.clone().unwrap_or_default(),
        });
    }

    Ok(envelope)
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_LEN).collect()
}

/// Accepts `https://script.google.com/macros/s/<id>/exec` and the
/// domain-scoped `https://script.google.com/a/macros/<domain>/s/<id>/exec`.
pub fn validate_gateway_url(url: &str) -> ConsoleResult<String> {
    let url = url.trim();
    let is_gateway = url.starts_with(GATEWAY_URL_PREFIX)
        && url.contains("/macros/")
        && (url.ends_with("/exec") || url.contains("/exec?"));

    if is_gateway {
        Ok(url.to_string())
    } else {
        Err(ConsoleError::Config(format!(
            "Invalid gateway URL '{}': expected {}.../macros/.../exec",
            url, GATEWAY_URL_PREFIX
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_gateway_url() {
        assert!(validate_gateway_url("https://script.google.com/macros/s/abc/exec").is_ok());
        assert!(validate_gateway_url(" https://script.google.com/a/macros/x.com/s/abc/exec?v=1 ").is_ok());
        assert!(validate_gateway_url("https://example.com/macros/s/abc/exec").is_err());
        assert!(validate_gateway_url("https://script.google.com/macros/s/abc/dev").is_err());
        assert!(validate_gateway_url("").is_err());
    }

    #[test]
    fn test_parse_envelope_html_body() {
        let html = "<!DOCTYPE html><html><body>Sign in</body></html>";
        match parse_envelope(200, "text/html", html) {
            Err(ConsoleError::UpstreamFormat { status, content_type, preview }) => {
                assert_eq!(status, 200);
                assert_eq!(content_type, "text/html");
                assert!(preview.starts_with("<!DOCTYPE html>"));
            }
            other => panic!("Expected UpstreamFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_envelope_wrapped_by_relay() {
        let body = r#"{"ok":false,"error":"Upstream returned non-JSON","status":302,"contentType":"text/html","preview":"<html>"}"#;
        match parse_envelope(502, "application/json", body) {
            Err(ConsoleError::UpstreamFormat { status, preview, .. }) => {
                assert_eq!(status, 302);
                assert_eq!(preview, "<html>");
            }
            other => panic!("Expected UpstreamFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_envelope_plain_rejection_passes_through() {
        let envelope = parse_envelope(200, "application/json", r#"{"ok":false,"error":"Unauthorized"}"#).unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.error.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn test_preview_is_bounded() {
        let long = "x".repeat(1000);
        match parse_envelope(500, "text/plain", &long) {
            Err(ConsoleError::UpstreamFormat { preview, .. }) => assert_eq!(preview.len(), PREVIEW_LEN),
            other => panic!("Expected UpstreamFormat, got {:?}", other),
        }
    }
}
