use crate::model::Article;

/// Produces the note body for `article`.
///
/// With no existing body (or an empty one) a front matter header and the tag
/// line are written first. Otherwise the existing body is kept as is and the
/// run's highlights are appended, oldest first.
pub fn build_note_content(article: &Article, existing: Option<&str>) -> String {
    let mut content = existing.unwrap_or_default().to_string();

    if content.is_empty() {
        content.push_str("---\n");
        content.push_str(&format!("title: {}\n", article.title));
        content.push_str(&format!("url: {}\n", article.url));
        content.push_str("---\n");
        for tag in &article.tags {
            content.push_str(&format!("#{} ", sanitize_tag(tag)));
        }
        content.push_str("\n\n");
    }

    let mut highlights: Vec<_> = article.highlights.iter().collect();
    highlights.sort_by_key(|h| h.created_at);

    for highlight in highlights {
        content.push_str(&format!("```\n{}\n```\n\n", highlight.text));
    }

    content
}

pub fn sanitize_tag(tag: &str) -> String {
    tag.chars()
        .map(|c| match c {
            ' ' => '-',
            c if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/') => c,
            _ => '_',
        })
        .collect()
}

pub fn sanitize_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '!' | '^' => '_',
            c => c,
        })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
