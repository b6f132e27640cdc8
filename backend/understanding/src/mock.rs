use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use scaleslip_core::{VisionOracle, VisionRequest, VisionResponse};

/// A mock oracle that returns a canned reply and counts calls.
pub struct MockOracle {
    name: String,
    fixed_response: Option<String>,
    failure: Option<String>,
    requests: Mutex<Vec<VisionRequest>>,
}

impl MockOracle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed_response: None,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Every call fails with this message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn last_request(&self) -> Option<VisionRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl VisionOracle for MockOracle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, req: &VisionRequest) -> Result<VisionResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        Ok(VisionResponse {
            content: self
                .fixed_response
                .clone()
                .unwrap_or_else(|| "[]".to_string()),
            provider: self.name.clone(),
            model: req.model.clone(),
            tokens_used: 0,
            latency_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn request() -> VisionRequest {
        VisionRequest {
            model: "mock".into(),
            prompt: "read".into(),
            image: Bytes::from_static(b"img"),
            mime_type: "image/png".into(),
            max_tokens: 10,
        }
    }

    #[tokio::test]
    async fn returns_canned_reply_and_records_call() {
        let oracle = MockOracle::new("mock").with_response(r#"[["Net", "1"]]"#);
        let reply = oracle.complete(&request()).await.unwrap();
        assert_eq!(reply.content, r#"[["Net", "1"]]"#);
        assert_eq!(oracle.call_count(), 1);
        assert_eq!(oracle.last_request().unwrap().mime_type, "image/png");
    }

    #[tokio::test]
    async fn failing_oracle_errors() {
        let oracle = MockOracle::new("mock").failing("timeout");
        let err = oracle.complete(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "timeout");
        assert_eq!(oracle.call_count(), 1);
    }
}
