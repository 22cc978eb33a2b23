use async_trait::async_trait;
use rock_analyzer::{HttpResponse, HttpTransport, RockError};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Smallest valid PNG signature, enough to stand in for image bytes.
#[allow(dead_code)]
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

#[allow(dead_code)]
pub const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46, 0x49, 0x46];

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CapturedRequest {
    pub url: String,
    pub api_key: String,
    pub body: Value,
}

/// Transport that counts calls and replays queued responses in order.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockTransport {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<Result<HttpResponse, RockError>>>,
    requests: Mutex<Vec<CapturedRequest>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn respond_with_content(self, content: &Value) -> Self {
        self.respond(200, completion_body(&content.to_string()))
    }

    pub fn fail(self, err: RockError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
    ) -> rock_analyzer::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(CapturedRequest {
            url: url.to_string(),
            api_key: api_key.to_string(),
            body: body.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RockError::Extraction("no mock response queued".to_string())))
    }
}

/// A chat completion response whose message content is `content`.
#[allow(dead_code)]
pub fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-2024-08-06",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content,
                "refusal": null
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 812,
            "completion_tokens": 143,
            "total_tokens": 955
        }
    })
    .to_string()
}

#[allow(dead_code)]
pub fn base_properties() -> Value {
    json!({
        "composition": "calcite with minor dolomite",
        "color": "light grey",
        "texture": "fine-grained, bioclastic",
        "hardness": "3",
        "density": "2.7 g/cm3",
        "formation": "marine carbonate deposition",
        "otherProperties": "effervesces in dilute HCl"
    })
}

/// Base properties merged with `extra`.
#[allow(dead_code)]
pub fn analysis_json(extra: Value) -> Value {
    let mut value = base_properties();
    if let (Some(target), Some(source)) = (value.as_object_mut(), extra.as_object()) {
        for (k, v) in source {
            target.insert(k.clone(), v.clone());
        }
    }
    value
}
