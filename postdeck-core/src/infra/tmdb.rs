use std::fmt;

use async_trait::async_trait;
use postdeck_model::{MediaKind, PosterRef, SubjectDetails};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PostError, Result};
use crate::ports::{MetadataProvider, SearchHit};

const TMDB_V3_BASE: &str = "https://api.themoviedb.org/3";
const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Search results offered per query.
pub const MAX_SEARCH_HITS: usize = 8;

/// TMDB v3 client over plain HTTP.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct KeyQuery<'a> {
    api_key: &'a str,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    api_key: &'a str,
    query: &'a str,
    include_adult: bool,
}

#[derive(Serialize)]
struct FindQuery<'a> {
    api_key: &'a str,
    external_source: &'a str,
}

#[derive(Debug, Deserialize)]
struct TmdbErrorBody {
    #[serde(default)]
    status_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<MultiResult>,
}

#[derive(Debug, Deserialize)]
struct MultiResult {
    id: u64,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<MultiResult>,
    #[serde(default)]
    tv_results: Vec<MultiResult>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    vote_average: Option<f32>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    poster_path: Option<String>,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, TMDB_V3_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<Q, T>(&self, path: &str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self.http.get(&url).query(query).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<TmdbErrorBody>()
            .await
            .ok()
            .and_then(|body| body.status_message)
            .unwrap_or_else(|| format!("TMDB request failed with status {status}"));
        debug!(path, %status, reason = %message, "tmdb request rejected");

        match status.as_u16() {
            404 => Err(PostError::NotFound(path.to_string())),
            _ => Err(PostError::collaborator("tmdb request", message)),
        }
    }
}

fn year_of(date: Option<&str>) -> Option<String> {
    date.and_then(|d| d.get(..4))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

impl MultiResult {
    fn into_hit(self, fallback: Option<MediaKind>) -> Option<SearchHit> {
        let kind = self
            .media_type
            .as_deref()
            .and_then(MediaKind::parse)
            .or(fallback)?;
        let title = self.title.or(self.name)?;
        let year = year_of(self.release_date.as_deref().or(self.first_air_date.as_deref()));
        Some(SearchHit {
            kind,
            id: self.id,
            title,
            year,
        })
    }
}

impl DetailsResponse {
    fn into_details(self, kind: MediaKind) -> SubjectDetails {
        SubjectDetails {
            kind,
            year: year_of(self.release_date.as_deref().or(self.first_air_date.as_deref())),
            title: self.title.or(self.name),
            rating: self.vote_average,
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            poster: self
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|path| PosterRef::Remote(format!("{TMDB_POSTER_BASE}{path}"))),
        }
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let page: SearchPage = self
            .get_json(
                "/search/multi",
                &SearchQuery {
                    api_key: &self.api_key,
                    query,
                    include_adult: false,
                },
            )
            .await?;
        Ok(page
            .results
            .into_iter()
            .filter_map(|result| result.into_hit(None))
            .take(MAX_SEARCH_HITS)
            .collect())
    }

    async fn find_by_imdb(&self, imdb_id: &str) -> Result<Vec<SearchHit>> {
        let found: FindResponse = self
            .get_json(
                &format!("/find/{imdb_id}"),
                &FindQuery {
                    api_key: &self.api_key,
                    external_source: "imdb_id",
                },
            )
            .await?;
        let movies = found
            .movie_results
            .into_iter()
            .filter_map(|r| r.into_hit(Some(MediaKind::Movie)));
        let shows = found
            .tv_results
            .into_iter()
            .filter_map(|r| r.into_hit(Some(MediaKind::Tv)));
        Ok(movies.chain(shows).take(MAX_SEARCH_HITS).collect())
    }

    async fn details(&self, kind: MediaKind, id: u64) -> Result<SubjectDetails> {
        let response: DetailsResponse = self
            .get_json(
                &format!("/{}/{id}", kind.as_str()),
                &KeyQuery {
                    api_key: &self.api_key,
                },
            )
            .await?;
        Ok(response.into_details(kind))
    }
}
