use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Article, Comment, Profile, User};

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct UserResponse {
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: String,
    pub image: String,
}

#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct ProfileResponse {
    pub username: String,
    pub bio: String,
    pub image: String,
    pub following: bool,
}

/// Unknown slugs are answered with `ArticleResponse::default()`, whose
/// author is `null`.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct ArticleResponse {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    #[serde(rename = "tagList")]
    pub tag_list: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub favorited: bool,
    #[serde(rename = "favoritesCount")]
    pub favorites_count: u64,
    pub author: Option<ProfileResponse>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CommentResponse {
    pub id: u64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub body: String,
    pub author: Option<ProfileResponse>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl UserResponse {
    pub fn new(
        User {
            username,
            email,
            bio,
            image,
            ..
        }: User,
        token: String,
    ) -> Self {
        UserResponse {
            email,
            token,
            username,
            bio,
            image,
        }
    }
}

impl ProfileResponse {
    pub fn new(
        Profile {
            username,
            bio,
            image,
            following,
        }: Profile,
    ) -> Self {
        ProfileResponse {
            username,
            bio,
            image,
            following,
        }
    }
}

impl CommentResponse {
    pub fn new(
        Comment {
            id,
            body,
            created_at,
            updated_at,
            ..
        }: Comment,
        author: Option<ProfileResponse>,
    ) -> Self {
        CommentResponse {
            id,
            created_at: timestamp(created_at),
            updated_at: timestamp(updated_at),
            body,
            author,
        }
    }
}

impl ArticleResponse {
    pub fn new(
        Article {
            slug,
            title,
            description,
            body,
            tag_list,
            created_at,
            updated_at,
            favorited,
            favorites_count,
            ..
        }: Article,
        author: Option<ProfileResponse>,
    ) -> Self {
        ArticleResponse {
            slug,
            title,
            description,
            body,
            tag_list,
            created_at: timestamp(created_at),
            updated_at: timestamp(updated_at),
            favorited,
            favorites_count,
            author,
        }
    }
}
