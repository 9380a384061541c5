use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::BackendError;

const HTTP_OK: u16 = 200;
const VALID_SUCCESS_CODES: &[u16] = &[HTTP_OK];

pub const TOTAL_PAGES_HEADER: &str = "total-pages";
pub const CURRENT_PAGE_HEADER: &str = "current-page";

/// What a transport hands back for a single request, before interpretation.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub ok: bool,
    pub status: u16,
    pub text: String,
    headers: HashMap<String, String>,
    pub json: JsonValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total_pages: u32,
    pub current_page: u32,
}

impl BackendResponse {
    pub fn from_transport(raw: RawResponse) -> Self {
        let headers = raw
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        let json = serde_json::from_str(&raw.body).unwrap_or(JsonValue::Null);

        BackendResponse {
            ok: VALID_SUCCESS_CODES.contains(&raw.status),
            status: raw.status,
            text: raw.body,
            headers,
            json,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    pub fn pagination(&self) -> Pagination {
        Pagination {
            total_pages: self.page_header(TOTAL_PAGES_HEADER),
            current_page: self.page_header(CURRENT_PAGE_HEADER),
        }
    }

    fn page_header(&self, name: &str) -> u32 {
        self.header(name)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(1)
    }

    pub fn error_for_status(self) -> Result<Self, BackendError> {
        if self.ok {
            return Ok(self);
        }

        tracing::error!(status = self.status, body = %self.text, "request failed");
        Err(BackendError::Http {
            status: self.status,
            body: self.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, headers: &[(&str, &str)], body: &str) -> RawResponse {
        RawResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_only_200_is_ok() {
        assert!(BackendResponse::from_transport(raw(200, &[], "[]")).ok);
        assert!(!BackendResponse::from_transport(raw(201, &[], "[]")).ok);
        assert!(!BackendResponse::from_transport(raw(204, &[], "")).ok);
        assert!(!BackendResponse::from_transport(raw(401, &[], "nope")).ok);
    }

    #[test]
    fn test_invalid_json_is_preserved_as_text() {
        let response = BackendResponse::from_transport(raw(500, &[], "<html>oops</html>"));

        assert_eq!(response.json, JsonValue::Null);
        assert_eq!(response.text, "<html>oops</html>");

        match response.error_for_status() {
            Err(BackendError::Http { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "<html>oops</html>");
            }
            other => panic!("expected http error, got {:?}", other),
        }
    }

    #[test]
    fn test_pagination_headers_are_case_insensitive() {
        let response = BackendResponse::from_transport(raw(
            200,
            &[("Total-Pages", "3"), ("CURRENT-PAGE", "1")],
            "[]",
        ));

        assert_eq!(response.header("total-pages"), Some("3"));
        assert_eq!(
            response.pagination(),
            Pagination {
                total_pages: 3,
                current_page: 1
            }
        );
    }

    #[test]
    fn test_pagination_defaults_to_single_page() {
        let missing = BackendResponse::from_transport(raw(200, &[], "[]"));
        assert_eq!(missing.pagination().total_pages, 1);
        assert_eq!(missing.pagination().current_page, 1);

        let garbage = BackendResponse::from_transport(raw(
            200,
            &[("Total-Pages", "many"), ("Current-Page", "-2")],
            "[]",
        ));
        assert_eq!(garbage.pagination().total_pages, 1);
        assert_eq!(garbage.pagination().current_page, 1);
    }
}
