use std::collections::HashSet;

use super::ContentStore;

impl ContentStore {
    /// Tags in first-attached order. The underlying list is append-only and
    /// may repeat a tag; the listing shows each one once.
    pub fn list_tags(&self) -> Vec<String> {
        let collections = self.read();
        let mut seen = HashSet::new();
        collections
            .tags
            .iter()
            .filter(|tag| seen.insert(*tag))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{article, profile};
    use super::*;

    #[test]
    fn tags_are_listed_once_in_order() {
        let store = ContentStore::new();
        store.insert_profile(profile("berke"));
        store
            .insert_article(article("a", "berke", &["dragons", "training"], false))
            .unwrap();
        store
            .insert_article(article("b", "berke", &["cats", "dragons"], false))
            .unwrap();
        assert_eq!(store.list_tags(), vec!["dragons", "training", "cats"]);
    }
}
