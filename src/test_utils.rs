use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::BackendError;
use crate::response::RawResponse;
use crate::transport::{Request, Transport};

pub const BASE_URL: &str = "http://readeck.test";
pub const TOKEN: &str = "secret-token";

/// In-memory transport answering from a fixed url -> response table and
/// recording every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, RawResponse>,
    broken: HashSet<String>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, status: u16, headers: &[(&str, &str)], body: JsonValue) -> Self {
        self.routes.insert(
            format!("{}{}", BASE_URL, path),
            RawResponse {
                status,
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_string(),
            },
        );
        self
    }

    pub fn respond_raw(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            format!("{}{}", BASE_URL, path),
            RawResponse {
                status,
                headers: vec![],
                body: body.to_string(),
            },
        );
        self
    }

    pub fn unreachable(mut self, path: &str) -> Self {
        self.broken.insert(format!("{}{}", BASE_URL, path));
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.url.trim_start_matches(BASE_URL).to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, request: Request) -> Result<RawResponse, BackendError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.broken.contains(&request.url) {
            return Err(BackendError::Transport(
                format!("connection refused: {}", request.url).into(),
            ));
        }

        Ok(self.routes.get(&request.url).cloned().unwrap_or(RawResponse {
            status: 404,
            headers: vec![],
            body: "not found".to_string(),
        }))
    }
}

pub fn annotation(bookmark_id: &str, text: &str, created: &str) -> JsonValue {
    serde_json::json!({
        "bookmark_id": bookmark_id,
        "text": text,
        "created": created,
        "bookmark_title": format!("Article {}", bookmark_id),
        "bookmark_url": format!("https://example.com/{}", bookmark_id),
    })
}
