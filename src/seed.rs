use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{Article, Comment, Profile};

/// A user as written in seed data. The password is hashed when the seed is
/// loaded into a store.
#[derive(Debug, Clone)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: String,
    pub image: String,
}

/// Initial contents for a `ContentStore`.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub profiles: Vec<Profile>,
    pub users: Vec<SeedUser>,
    pub articles: Vec<Article>,
    pub comments: Vec<Comment>,
}

fn timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid seed timestamp {raw}"))?
        .with_timezone(&Utc))
}

impl Seed {
    /// The demo dataset the content service starts with.
    pub fn demo() -> Result<Self> {
        let created_at = timestamp("2016-02-18T03:22:56.637Z")?;
        let updated_at = timestamp("2016-02-18T03:48:35.824Z")?;

        let profile = |username: &str, bio: &str| Profile {
            username: username.into(),
            bio: bio.into(),
            image: String::new(),
            following: false,
        };
        let user = |username: &str, email: &str, password: &str, bio: &str| SeedUser {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            bio: bio.into(),
            image: String::new(),
        };

        Ok(Seed {
            profiles: vec![
                profile("berke", "I am a student."),
                profile("keskul", "I am a cat."),
            ],
            users: vec![
                user("keskul", "keskul@home.com", "123456", "I am a cat."),
                user(
                    "berke",
                    "berke.ahlatci@gmail.com",
                    "654321",
                    "I am a student.",
                ),
            ],
            articles: vec![Article {
                slug: "how-to-train-your-dragon".into(),
                title: "How to train your dragon".into(),
                description: "Ever wonder how?".into(),
                body: "It takes a Jacobian".into(),
                tag_list: vec!["dragons".into(), "training".into()],
                created_at,
                updated_at,
                favorited: false,
                favorites_count: 0,
                author: "berke".into(),
            }],
            comments: vec![Comment {
                id: 1,
                body: "Nice post, thanks!".into(),
                created_at,
                updated_at,
                author: "keskul".into(),
                slug: "how-to-train-your-dragon".into(),
            }],
        })
    }
}
