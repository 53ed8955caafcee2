use std::fmt;

use crate::files::ContentHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaKind {
    #[default]
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Tv => "Web Series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a poster image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PosterRef {
    /// Remote image URL (metadata service artwork).
    Remote(String),
    /// Image already uploaded to the messaging platform.
    Staged(ContentHandle),
}

/// Descriptive metadata of the movie or series being posted.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubjectDetails {
    pub kind: MediaKind,
    pub title: Option<String>,
    pub year: Option<String>,
    pub rating: Option<f32>,
    pub genres: Vec<String>,
    pub poster: Option<PosterRef>,
}

impl SubjectDetails {
    pub fn for_kind(kind: MediaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown")
    }

    pub fn display_year(&self) -> &str {
        self.year.as_deref().unwrap_or("----")
    }

    pub fn display_rating(&self) -> String {
        format!("{:.1}", self.rating.unwrap_or(0.0))
    }

    /// At most three genres, comma separated.
    pub fn display_genres(&self) -> String {
        if self.genres.is_empty() {
            return "N/A".to_string();
        }
        self.genres
            .iter()
            .take(3)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_helpers_fall_back_for_missing_fields() {
        let details = SubjectDetails::default();
        assert_eq!(details.display_title(), "Unknown");
        assert_eq!(details.display_year(), "----");
        assert_eq!(details.display_rating(), "0.0");
        assert_eq!(details.display_genres(), "N/A");
    }

    #[test]
    fn genres_are_capped_at_three() {
        let details = SubjectDetails {
            genres: vec!["Action".into(), "Drama".into(), "Crime".into(), "War".into()],
            ..SubjectDetails::default()
        };
        assert_eq!(details.display_genres(), "Action, Drama, Crime");
    }
}
