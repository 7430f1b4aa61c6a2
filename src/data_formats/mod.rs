mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use std::collections::HashMap;

pub const DEFAULT_LIMIT: usize = 20;

/// Query parameters of `GET /api/articles`.
///
/// All three filters are kept; the store applies at most one of them,
/// in the order tag, author, favorited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFilter {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub favorited: bool,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        ArticleFilter {
            tag: None,
            author: None,
            favorited: false,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl ArticleFilter {
    /// Builds a filter from raw query parameters. Empty values count as
    /// absent, and pagination values that are not non-negative integers
    /// fall back to their defaults.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        ArticleFilter {
            tag: non_empty(params, "tag"),
            author: non_empty(params, "author"),
            favorited: non_empty(params, "favorited").is_some(),
            limit: parse_or_default(params, "limit", DEFAULT_LIMIT),
            offset: parse_or_default(params, "offset", 0),
        }
    }
}

fn non_empty(params: &HashMap<String, String>, key: &str) -> Option<String> {
    params.get(key).filter(|value| !value.is_empty()).cloned()
}

fn parse_or_default(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    match params.get(key).filter(|value| !value.is_empty()) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "Invalid pagination value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_given() {
        assert_eq!(ArticleFilter::from_query(&HashMap::new()), ArticleFilter::default());
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let filter = ArticleFilter::from_query(&query(&[("limit", "ten"), ("offset", "-3")]));
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert_eq!(filter.offset, 0);
    }

    #[test]
    fn empty_values_are_absent() {
        let filter = ArticleFilter::from_query(&query(&[
            ("tag", ""),
            ("author", "berke"),
            ("favorited", ""),
            ("limit", "5"),
            ("offset", "2"),
        ]));
        assert_eq!(filter.tag, None);
        assert_eq!(filter.author.as_deref(), Some("berke"));
        assert!(!filter.favorited);
        assert_eq!((filter.limit, filter.offset), (5, 2));
    }
}
