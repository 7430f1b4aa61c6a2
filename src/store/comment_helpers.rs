use crate::{data_formats::CommentResponse, models::Comment};

use super::{ContentStore, StoreError};

impl ContentStore {
    /// Comments of an article in insertion order; unknown slugs have none.
    pub fn list_comments(&self, slug: &str) -> Vec<CommentResponse> {
        let collections = self.read();
        collections
            .comments
            .iter()
            .filter(|comment| comment.slug == slug)
            .map(|comment| {
                CommentResponse::new(
                    comment.clone(),
                    collections.profile_response(&comment.author),
                )
            })
            .collect()
    }

    pub fn insert_comment(&self, comment: Comment) -> Result<(), StoreError> {
        let mut collections = self.write();
        if collections.comments.iter().any(|c| c.id == comment.id) {
            return Err(StoreError::DuplicateCommentId(comment.id));
        }
        if !collections.articles.iter().any(|a| a.slug == comment.slug) {
            return Err(StoreError::UnknownArticle(comment.slug));
        }
        if !collections.profiles.contains_key(&comment.author) {
            return Err(StoreError::UnknownAuthor(comment.author));
        }
        collections.comments.push(comment);
        Ok(())
    }
}
