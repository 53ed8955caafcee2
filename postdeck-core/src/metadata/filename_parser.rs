use once_cell::sync::Lazy;
use regex::Regex;

// Ordered patterns, first match wins within each field.
static SEASON_EPISODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)s(\d{1,3})[ ._-]?e(\d{1,4})").expect("season/episode regex should compile")
});
static EPISODE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])e(\d{1,4})").expect("episode regex should compile")
});
static SEASON_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])s(\d{1,3})").expect("season regex should compile")
});
static QUALITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(480p|720p|1080p|2160p)").expect("quality regex should compile")
});

/// How much of the structure was read from the name itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Season, episode and quality were all present.
    Full,
    /// Episode found, season or quality defaulted.
    Partial,
    /// No episode marker; the raw name is used as the group.
    Fallback,
}

/// Raw fields found in a name. `None` means the marker was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedName {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub quality: Option<String>,
}

impl ParsedName {
    pub fn confidence(&self) -> Confidence {
        match (self.season, self.episode, &self.quality) {
            (_, None, _) | (_, Some(0), _) => Confidence::Fallback,
            (Some(_), Some(_), Some(_)) => Confidence::Full,
            _ => Confidence::Partial,
        }
    }
}

/// Best-effort reader for `S01E05`-style release names.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameParser;

impl FilenameParser {
    pub fn parse(name: &str) -> ParsedName {
        let (season, episode) = match Self::combined(name) {
            Some((season, episode)) => (Some(season), Some(episode)),
            None => (Self::season(name), Self::episode(name)),
        };

        ParsedName {
            season,
            episode,
            quality: Self::quality(name),
        }
    }

    fn combined(name: &str) -> Option<(u32, u32)> {
        let caps = SEASON_EPISODE_REGEX.captures(name)?;
        let season = caps.get(1)?.as_str().parse().ok()?;
        let episode = caps.get(2)?.as_str().parse().ok()?;
        Some((season, episode))
    }

    fn episode(name: &str) -> Option<u32> {
        EPISODE_REGEX
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn season(name: &str) -> Option<u32> {
        SEASON_REGEX
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn quality(name: &str) -> Option<String> {
        QUALITY_REGEX
            .find(name)
            .map(|m| m.as_str().to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_marker_wins() {
        let parsed = FilenameParser::parse("Show.S02E07.1080p.mkv");
        assert_eq!(parsed.season, Some(2));
        assert_eq!(parsed.episode, Some(7));
        assert_eq!(parsed.quality.as_deref(), Some("1080p"));
        assert_eq!(parsed.confidence(), Confidence::Full);
    }

    #[test]
    fn separated_markers_are_accepted() {
        let parsed = FilenameParser::parse("show s3 - e12 [720P].mp4");
        assert_eq!(parsed.season, Some(3));
        assert_eq!(parsed.episode, Some(12));
        assert_eq!(parsed.quality.as_deref(), Some("720p"));
    }

    #[test]
    fn episode_without_season_is_partial() {
        let parsed = FilenameParser::parse("Anime_E05_480p.mkv");
        assert_eq!(parsed.season, None);
        assert_eq!(parsed.episode, Some(5));
        assert_eq!(parsed.confidence(), Confidence::Partial);
    }

    #[test]
    fn letters_inside_words_are_not_markers() {
        let parsed = FilenameParser::parse("The.Bees3.Knees.mkv");
        assert_eq!(parsed.episode, None);
        assert_eq!(parsed.season, None);
        assert_eq!(parsed.confidence(), Confidence::Fallback);
    }

    #[test]
    fn zero_episode_falls_back() {
        let parsed = FilenameParser::parse("Show.S01E00.mkv");
        assert_eq!(parsed.episode, Some(0));
        assert_eq!(parsed.confidence(), Confidence::Fallback);
    }
}
