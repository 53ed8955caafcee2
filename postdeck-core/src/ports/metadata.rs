use async_trait::async_trait;
use once_cell::sync::Lazy;
use postdeck_model::{MediaKind, SubjectDetails};
use regex::Regex;

use crate::error::Result;

static TMDB_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"themoviedb\.org/(movie|tv)/(\d+)").expect("tmdb url regex should compile")
});
static IMDB_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"tt\d{5,}").expect("imdb id regex should compile"));

/// How a `/post` argument should be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    /// A metadata-service URL naming the subject directly.
    Direct { kind: MediaKind, id: u64 },
    /// An IMDb title id such as `tt0111161`.
    Imdb(String),
    /// Free text search.
    Search(String),
}

impl LookupQuery {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        if let Some(caps) = TMDB_URL_REGEX.captures(input) {
            let kind = caps.get(1).and_then(|m| MediaKind::parse(m.as_str()));
            let id = caps.get(2).and_then(|m| m.as_str().parse::<u64>().ok());
            if let (Some(kind), Some(id)) = (kind, id) {
                return LookupQuery::Direct { kind, id };
            }
        }

        if let Some(found) = IMDB_ID_REGEX.find(input) {
            return LookupQuery::Imdb(found.as_str().to_string());
        }

        LookupQuery::Search(input.to_string())
    }
}

/// One search result offered to the user as a selection button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub kind: MediaKind,
    pub id: u64,
    pub title: String,
    pub year: Option<String>,
}

impl SearchHit {
    pub fn label(&self) -> String {
        format!(
            "🎬 {} ({})",
            self.title,
            self.year.as_deref().unwrap_or("----")
        )
    }
}

/// Movie/TV metadata service.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Multi search restricted to movies and series.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Vec<SearchHit>>;

    async fn details(&self, kind: MediaKind, id: u64) -> Result<SubjectDetails>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmdb_urls_resolve_directly() {
        assert_eq!(
            LookupQuery::parse("https://www.themoviedb.org/tv/1399-game-of-thrones"),
            LookupQuery::Direct {
                kind: MediaKind::Tv,
                id: 1399
            }
        );
    }

    #[test]
    fn imdb_ids_are_extracted_from_links() {
        assert_eq!(
            LookupQuery::parse("https://www.imdb.com/title/tt0111161/"),
            LookupQuery::Imdb("tt0111161".into())
        );
    }

    #[test]
    fn anything_else_is_a_search() {
        assert_eq!(
            LookupQuery::parse("  Spider Man  "),
            LookupQuery::Search("Spider Man".into())
        );
        // too short to be an IMDb id
        assert_eq!(
            LookupQuery::parse("tt123"),
            LookupQuery::Search("tt123".into())
        );
    }
}
