use std::collections::HashMap;

use crate::model::Article;

/// Articles discovered during one sync run, keyed by remote bookmark id.
///
/// Keeps first-insertion order so the run returns articles in the order
/// their first highlight arrived.
#[derive(Debug, Default)]
pub struct ArticleCache {
    registry: HashMap<String, Article>,
    order: Vec<String>,
}

impl ArticleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Article> {
        self.registry.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Article> {
        self.registry.get_mut(id)
    }

    /// Replaces whatever is stored under `id`. Callers check `get` first.
    pub fn set(&mut self, id: &str, title: &str, url: &str) {
        if self
            .registry
            .insert(id.to_string(), Article::new(title, url))
            .is_none()
        {
            self.order.push(id.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn into_articles(mut self) -> Vec<Article> {
        self.order
            .iter()
            .filter_map(|id| self.registry.remove(id))
            .collect()
    }
}
