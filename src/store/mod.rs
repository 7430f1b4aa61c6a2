use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    authentication::hash_password,
    data_formats::{ArticleResponse, ProfileResponse},
    models::{Article, Comment, Profile, Session, User},
    seed::Seed,
};

mod article_helpers;
mod comment_helpers;
mod profile_helpers;
mod session_helpers;
mod tag_helpers;
mod user_helpers;

pub use user_helpers::{LoginFailure, NewUser, UserChanges};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("article slug {0:?} already exists")]
    DuplicateSlug(String),
    #[error("comment id {0} already exists")]
    DuplicateCommentId(u64),
    #[error("no profile for author {0:?}")]
    UnknownAuthor(String),
    #[error("no article with slug {0:?}")]
    UnknownArticle(String),
    #[error("no user with id {0}")]
    UnknownUser(u64),
}

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    profiles: HashMap<String, Profile>,
    articles: Vec<Article>,
    comments: Vec<Comment>,
    tags: Vec<String>,
    sessions: HashMap<String, Session>,
    next_user_id: u64,
}

/// Process-lifetime storage for the content service.
///
/// The collections are only reachable through the store's operations, all
/// of which go through one `RwLock`. Lookups hand out owned copies so that
/// no reference into a collection outlives the guard.
#[derive(Debug, Default)]
pub struct ContentStore {
    collections: RwLock<Collections>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a seed dataset, hashing the plaintext seed passwords. Fails if
    /// the seed breaks a uniqueness or reference invariant.
    pub fn from_seed(
        Seed {
            profiles,
            users,
            articles,
            comments,
        }: Seed,
    ) -> anyhow::Result<Self> {
        let store = Self::new();
        for profile in profiles {
            store.insert_profile(profile);
        }
        for user in users {
            let password_hash = hash_password(&user.password)?;
            store.register_user(NewUser {
                username: user.username,
                email: user.email,
                password_hash,
                bio: user.bio,
                image: user.image,
            })?;
        }
        for article in articles {
            store.insert_article(article)?;
        }
        for comment in comments {
            store.insert_comment(comment)?;
        }
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, Collections> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Collections> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Collections {
    fn profile_response(&self, username: &str) -> Option<ProfileResponse> {
        self.profiles
            .get(username)
            .cloned()
            .map(ProfileResponse::new)
    }

    fn article_response(&self, article: &Article) -> ArticleResponse {
        ArticleResponse::new(article.clone(), self.profile_response(&article.author))
    }
}
