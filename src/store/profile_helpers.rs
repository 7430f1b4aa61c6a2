use crate::{data_formats::ProfileResponse, models::Profile};

use super::{Collections, ContentStore};

impl ContentStore {
    pub fn find_profile(&self, username: &str) -> Option<ProfileResponse> {
        self.read().profile_response(username)
    }

    /// Adds a profile unless one already exists for that username.
    pub fn insert_profile(&self, profile: Profile) {
        self.write()
            .profiles
            .entry(profile.username.clone())
            .or_insert(profile);
    }
}

impl Collections {
    /// Moves a profile to a new username and repoints every author
    /// reference at it.
    pub(super) fn rename_profile(&mut self, from: &str, to: &str) {
        if let Some(mut profile) = self.profiles.remove(from) {
            profile.username = to.to_owned();
            self.profiles.insert(to.to_owned(), profile);
        }
        for article in self.articles.iter_mut().filter(|a| a.author == from) {
            article.author = to.to_owned();
        }
        for comment in self.comments.iter_mut().filter(|c| c.author == from) {
            comment.author = to.to_owned();
        }
    }
}
