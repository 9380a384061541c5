use crate::cache::ArticleCache;
use crate::error::SyncError;
use crate::model::{Highlight, RawHighlight};

/// Turns one annotation record into a `Highlight`, registering its article
/// in `cache` the first time the bookmark id shows up.
///
/// Title and url are only read on first sight; a record without them still
/// yields an article with empty fields. Tags and the highlight list are left
/// to the caller.
pub fn to_highlight(raw: &RawHighlight, cache: &mut ArticleCache) -> Result<Highlight, SyncError> {
    let bookmark_id = raw.bookmark_id()?;
    let text = raw.text()?;
    let created_at = raw.created_at()?;

    if cache.get(bookmark_id).is_none() {
        let title = raw.bookmark_title.as_deref().unwrap_or_default();
        let url = raw.bookmark_url.as_deref().unwrap_or_default();

        tracing::debug!(bookmark_id, title, "new article discovered");
        cache.set(bookmark_id, title, url);
    }

    Ok(Highlight {
        bookmark_id: bookmark_id.to_string(),
        text: text.to_string(),
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawHighlight {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_first_sight_creates_article() {
        let mut cache = ArticleCache::new();
        let highlight = to_highlight(
            &raw(json!({
                "bookmark_id": "b1",
                "text": "a quote",
                "created": "2024-01-02T00:00:00Z",
                "bookmark_title": "Title",
                "bookmark_url": "https://example.com/a"
            })),
            &mut cache,
        )
        .unwrap();

        assert_eq!(highlight.bookmark_id, "b1");
        assert_eq!(highlight.text, "a quote");

        let article = cache.get("b1").unwrap();
        assert_eq!(article.title, "Title");
        assert_eq!(article.url, "https://example.com/a");
        assert!(article.highlights.is_empty());
        assert!(article.tags.is_empty());
    }

    #[test]
    fn test_known_article_is_not_recreated() {
        let mut cache = ArticleCache::new();
        cache.set("b1", "Original", "https://example.com/a");
        cache.get_mut("b1").unwrap().tags.push("kept".to_string());

        to_highlight(
            &raw(json!({
                "bookmark_id": "b1",
                "text": "second",
                "created": "2024-01-03T00:00:00Z",
                "bookmark_title": "Other title"
            })),
            &mut cache,
        )
        .unwrap();

        let article = cache.get("b1").unwrap();
        assert_eq!(article.title, "Original");
        assert_eq!(article.tags, vec!["kept".to_string()]);
    }

    #[test]
    fn test_missing_title_and_url_are_tolerated() {
        let mut cache = ArticleCache::new();
        to_highlight(
            &raw(json!({
                "bookmark_id": "b2",
                "text": "orphan",
                "created": "2024-01-02T00:00:00Z"
            })),
            &mut cache,
        )
        .unwrap();

        let article = cache.get("b2").unwrap();
        assert_eq!(article.title, "");
        assert_eq!(article.url, "");
    }

    #[test]
    fn test_missing_bookmark_id_does_not_touch_cache() {
        let mut cache = ArticleCache::new();
        let result = to_highlight(
            &raw(json!({"text": "x", "created": "2024-01-02T00:00:00Z"})),
            &mut cache,
        );

        assert!(matches!(result, Err(SyncError::InvalidPayload(_))));
        assert!(cache.is_empty());
    }
}
