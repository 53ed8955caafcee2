//! Structural metadata (season, episode, quality) inferred from file names.

mod filename_parser;

use std::fmt;

pub use filename_parser::{Confidence, FilenameParser, ParsedName};

/// Quality label used when nothing better is known.
pub const FALLBACK_QUALITY: &str = "HD";

/// Name used when a file has neither a file name nor a caption.
pub const PLACEHOLDER_NAME: &str = "Unknown";

/// Characters of the raw name kept as the group key when no episode marker
/// is found.
pub const FALLBACK_KEY_CHARS: usize = 20;

/// Name of a group: one logical unit (an episode, a quality, a custom
/// button) that may be backed by several files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The synthesized `S<season> E<episode>` key.
    pub fn episodic(season: u32, episode: u32) -> Self {
        Self(format!("S{season} E{episode}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(season, episode)` when the key has the exact `S<n> E<m>` shape.
    pub fn episode(&self) -> Option<(u32, u32)> {
        let (season, episode) = self.0.split_once(' ')?;
        let season = season.strip_prefix('S')?;
        let episode = episode.strip_prefix('E')?;
        if season.is_empty()
            || episode.is_empty()
            || !season.chars().all(|c| c.is_ascii_digit())
            || !episode.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        Some((season.parse().ok()?, episode.parse().ok()?))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an upload's group key and quality come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionMode<'a> {
    /// Infer from the file name.
    AutoDetect,
    /// Use a label picked by the user (a quality button or custom name).
    Manual { label: &'a str },
}

/// Group key and quality assigned to one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub key: GroupKey,
    pub quality: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub confidence: Confidence,
}

/// Pure mapping from an upload's name to its group.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// The name an upload is judged by: file name, then caption, then a
    /// placeholder.
    pub fn source_name<'a>(file_name: Option<&'a str>, caption: Option<&'a str>) -> &'a str {
        file_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| caption.filter(|c| !c.trim().is_empty()))
            .unwrap_or(PLACEHOLDER_NAME)
    }

    pub fn extract(name: &str, mode: DetectionMode<'_>) -> Extraction {
        match mode {
            DetectionMode::Manual { label } => Extraction {
                key: GroupKey::new(label),
                quality: label.to_string(),
                season: None,
                episode: None,
                confidence: Confidence::Full,
            },
            DetectionMode::AutoDetect => Self::detect(name),
        }
    }

    fn detect(name: &str) -> Extraction {
        let parsed = FilenameParser::parse(name);
        let quality = parsed
            .quality
            .clone()
            .unwrap_or_else(|| FALLBACK_QUALITY.to_string());

        match parsed.episode.filter(|episode| *episode > 0) {
            Some(episode) => {
                let season = parsed.season.unwrap_or(1);
                Extraction {
                    key: GroupKey::episodic(season, episode),
                    quality,
                    season: Some(season),
                    episode: Some(episode),
                    confidence: parsed.confidence(),
                }
            }
            None => Extraction {
                key: GroupKey::new(truncate_chars(name, FALLBACK_KEY_CHARS)),
                quality,
                season: parsed.season,
                episode: None,
                confidence: Confidence::Fallback,
            },
        }
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
