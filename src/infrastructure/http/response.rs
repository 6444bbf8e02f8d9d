use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{ClientError, ClientResult};

/// Buffered backend response; status codes are data here, not errors
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
    pub body_bytes: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl ApiResponse {
    pub(crate) async fn from_response(response: reqwest::Response) -> ClientResult<Self> {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body_bytes = response.bytes().await?.to_vec();

        Ok(Self::from_parts(status, headers, body_bytes))
    }

    pub fn from_parts(
        status: StatusCode,
        headers: HashMap<String, String>,
        body_bytes: Vec<u8>,
    ) -> Self {
        let body = if !body_bytes.is_empty() {
            serde_json::from_slice(&body_bytes).ok()
        } else {
            None
        };

        Self {
            status,
            body,
            body_bytes,
            headers,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Decode the body as `T`
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        Ok(serde_json::from_slice(&self.body_bytes)?)
    }

    /// Human readable error message from the body.
    ///
    /// Accepts `{"message": ..}`, `{"error": {"message": ..}}` and
    /// `{"error": ".."}`; falls back to the raw text body.
    pub fn error_message(&self) -> Option<String> {
        if let Some(body) = &self.body {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| {
                    body.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(Value::as_str)
                })
                .or_else(|| body.get("error").and_then(Value::as_str));
            if let Some(message) = message {
                return Some(message.to_string());
            }
        }

        let text = String::from_utf8_lossy(&self.body_bytes).trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    /// Turn a non-success status into a `ClientError`
    pub fn into_result(self) -> ClientResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self.error_message().unwrap_or_else(|| {
            self.status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
        Err(ClientError::from_status(self.status, message))
    }
}
