use std::collections::HashSet;

use futures_util::future::try_join_all;

use crate::cache::ArticleCache;
use crate::error::{BackendError, SyncError};
use crate::highlight::to_highlight;
use crate::model::{Article, BookmarkDetails, RawHighlight};
use crate::response::BackendResponse;
use crate::transport::{Request, Transport};

pub const HIGHLIGHTS_PER_PAGE: u32 = 20;

/// Upper bound on `Total-Pages * page_size` accepted from the server.
pub const MAX_HIGHLIGHTS: u64 = 1_000_000;

const ANNOTATIONS_PATH: &str = "/api/bookmarks/annotations";
const BOOKMARKS_PATH: &str = "/api/bookmarks";
const CONNECTION_CHECK_PATH: &str = "/api/bookmarks?limit=1";

pub struct ReadeckBackend<T: Transport> {
    transport: T,
    base_url: String,
    default_headers: Vec<(String, String)>,
    page_size: u32,
}

impl<T: Transport> ReadeckBackend<T> {
    pub fn new(transport: T, base_url: &str, api_token: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Authorization".to_string(), format!("Bearer {}", api_token)),
            ],
            page_size: HIGHLIGHTS_PER_PAGE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn make_request(&self, path: &str) -> Result<BackendResponse, BackendError> {
        let request = Request {
            url: format!("{}{}", self.base_url, path),
            headers: self.default_headers.clone(),
        };

        let raw = self.transport.get(request).await.map_err(|e| {
            tracing::error!(path, error = %crate::unpack_error(&e), "request error");
            e
        })?;

        BackendResponse::from_transport(raw).error_for_status()
    }

    pub async fn check_connection(&self) -> Result<(), BackendError> {
        self.make_request(CONNECTION_CHECK_PATH).await?;
        Ok(())
    }

    pub async fn fetch_tags_for_article(&self, id: &str) -> Result<Vec<String>, SyncError> {
        let path = format!("{}/{}", BOOKMARKS_PATH, urlencoding::encode(id));
        let response = self.make_request(&path).await?;

        let details: BookmarkDetails = serde_json::from_value(response.json).map_err(|e| {
            SyncError::InvalidPayload(format!("bookmark {} has an unexpected shape: {}", id, e))
        })?;

        Ok(details.labels)
    }

    /// Fetches the first page, then every remaining page at once. One failed
    /// page fails the lot.
    async fn request_highlight_pages(&self) -> Result<Vec<BackendResponse>, SyncError> {
        let path = format!("{}?limit={}", ANNOTATIONS_PATH, self.page_size);
        let first = self.make_request(&path).await?;
        let pagination = first.pagination();

        tracing::info!(
            total_pages = pagination.total_pages,
            current_page = pagination.current_page,
            "fetched first highlights page"
        );

        if u64::from(pagination.total_pages) * u64::from(self.page_size) > MAX_HIGHLIGHTS {
            return Err(SyncError::InvalidPayload(format!(
                "Total-Pages={} with page size {} exceeds {} highlights",
                pagination.total_pages, self.page_size, MAX_HIGHLIGHTS
            )));
        }

        // pages are 1-based; offset of page index n is page_size * n
        let mut page_paths = Vec::new();
        for page in pagination.current_page.max(1)..pagination.total_pages {
            let offset = self.page_size.checked_mul(page).ok_or_else(|| {
                SyncError::InvalidPayload(format!("offset for page {} overflows", page))
            })?;
            page_paths.push(format!("{}&offset={}", path, offset));
        }

        let remaining = page_paths
            .iter()
            .map(|page_path| self.make_request(page_path));

        let mut responses = vec![first];
        responses.extend(try_join_all(remaining).await?);

        Ok(responses)
    }

    /// Returns every article that received a highlight newer than
    /// `last_sync_ms` (epoch milliseconds, exclusive), with its tags and
    /// those highlights in arrival order.
    pub async fn fetch_highlights(&self, last_sync_ms: i64) -> Result<Vec<Article>, SyncError> {
        let responses = self.request_highlight_pages().await?;

        let mut payloads = Vec::new();
        for response in responses {
            let page: Vec<RawHighlight> = serde_json::from_value(response.json).map_err(|e| {
                SyncError::InvalidPayload(format!("highlights page is not a list of annotations: {}", e))
            })?;
            payloads.extend(page);
        }

        let total = payloads.len();
        let mut fresh = Vec::with_capacity(total);
        for payload in payloads {
            if payload.created_at()?.timestamp_millis() > last_sync_ms {
                fresh.push(payload);
            }
        }

        tracing::info!(total, fresh = fresh.len(), last_sync_ms, "filtered highlights");

        let mut cache = ArticleCache::new();
        let mut tagged: HashSet<String> = HashSet::new();

        for payload in &fresh {
            let highlight = to_highlight(payload, &mut cache)?;
            let bookmark_id = highlight.bookmark_id.clone();

            if !tagged.contains(&bookmark_id) {
                let tags = self.fetch_tags_for_article(&bookmark_id).await?;
                cached_article(&mut cache, &bookmark_id)?.tags = tags;
                tagged.insert(bookmark_id.clone());
            }

            cached_article(&mut cache, &bookmark_id)?
                .highlights
                .push(highlight);
        }

        Ok(cache.into_articles())
    }
}

fn cached_article<'a>(cache: &'a mut ArticleCache, id: &str) -> Result<&'a mut Article, SyncError> {
    cache
        .get_mut(id)
        .ok_or_else(|| SyncError::Consistency(format!("bookmark with id: {} was not found in cache", id)))
}
