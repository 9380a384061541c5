use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::model::Article;
use crate::render::{build_note_content, sanitize_file_name};
use crate::sync::SyncResult;

/// Folder of markdown notes, one per article, named after the article title.
#[derive(Debug, Clone)]
pub struct NoteVault {
    folder: PathBuf,
}

impl NoteVault {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn note_path(&self, article: &Article) -> PathBuf {
        self.folder
            .join(format!("{}.md", sanitize_file_name(&article.title)))
    }

    pub async fn ensure_folder_exists(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.folder).await.unwrap_or(false) {
            return Ok(());
        }

        tracing::info!(folder = ?self.folder, "creating sync folder");
        tokio::fs::create_dir_all(&self.folder)
            .await
            .with_context(|| format!("failed to create sync folder {}", self.folder.display()))
    }

    /// Writes the article's highlights into its note, creating the note when
    /// missing. The carried value is the number of highlights written.
    pub async fn upsert_article(&self, article: &Article) -> Result<SyncResult<usize>> {
        let path = self.note_path(article);
        let count = article.highlights.len();

        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read note {}", path.display()));
            }
        };

        let content = build_note_content(article, existing.as_deref());
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("failed to write note {}", path.display()))?;

        tracing::debug!(path = ?path, highlights = count, "note written");

        Ok(match existing {
            Some(_) => SyncResult::Updated(count),
            None => SyncResult::Created(count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Highlight;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, text: &str, day: u32) -> Article {
        Article {
            title: title.to_string(),
            url: "https://example.com".to_string(),
            tags: vec!["tag".to_string()],
            highlights: vec![Highlight {
                bookmark_id: "b1".to_string(),
                text: text.to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            }],
        }
    }

    #[tokio::test]
    async fn test_ensure_folder_creates_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let vault = NoteVault::new(dir.path().join("Readeck"));

        vault.ensure_folder_exists().await.unwrap();
        vault.ensure_folder_exists().await.unwrap();

        assert!(dir.path().join("Readeck").is_dir());
    }

    #[tokio::test]
    async fn test_upsert_creates_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let vault = NoteVault::new(dir.path());

        let created = vault.upsert_article(&article("What: a title?", "one", 2)).await.unwrap();
        assert!(matches!(created, SyncResult::Created(1)));

        let updated = vault.upsert_article(&article("What: a title?", "two", 3)).await.unwrap();
        assert!(matches!(updated, SyncResult::Updated(1)));

        let content = std::fs::read_to_string(dir.path().join("What_ a title_.md")).unwrap();
        assert_eq!(content.matches("title: What: a title?").count(), 1);
        assert!(content.contains("```\none\n```"));
        assert!(content.ends_with("```\ntwo\n```\n\n"));
    }
}
