use crate::{
    data_formats::{ArticleFilter, ArticleResponse},
    models::Article,
};

use super::{ContentStore, StoreError};

/// Filters are mutually exclusive; the first one present wins.
fn matches(filter: &ArticleFilter, article: &Article) -> bool {
    if let Some(tag) = &filter.tag {
        article.tag_list.iter().any(|t| t == tag)
    } else if let Some(author) = &filter.author {
        &article.author == author
    } else if filter.favorited {
        article.favorited
    } else {
        true
    }
}

/// Yields `max(0, min(limit, total - offset))` items; an offset past the
/// end gives nothing.
fn paginate<I: Iterator>(items: I, offset: usize, limit: usize) -> impl Iterator<Item = I::Item> {
    items.skip(offset).take(limit)
}

impl ContentStore {
    pub fn list_articles(&self, filter: &ArticleFilter) -> Vec<ArticleResponse> {
        let collections = self.read();
        let selected = collections
            .articles
            .iter()
            .filter(|article| matches(filter, article));
        paginate(selected, filter.offset, filter.limit)
            .map(|article| collections.article_response(article))
            .collect()
    }

    pub fn find_article_by_slug(&self, slug: &str) -> Option<ArticleResponse> {
        let collections = self.read();
        collections
            .articles
            .iter()
            .find(|article| article.slug == slug)
            .map(|article| collections.article_response(article))
    }

    /// Appends an article and its tags to the global tag list.
    pub fn insert_article(&self, article: Article) -> Result<(), StoreError> {
        let mut collections = self.write();
        if collections.articles.iter().any(|a| a.slug == article.slug) {
            return Err(StoreError::DuplicateSlug(article.slug));
        }
        if !collections.profiles.contains_key(&article.author) {
            return Err(StoreError::UnknownAuthor(article.author));
        }
        collections.tags.extend(article.tag_list.iter().cloned());
        collections.articles.push(article);
        Ok(())
    }
}
