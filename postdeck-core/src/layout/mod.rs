//! Compiles the accumulated group links of a session into the download
//! keyboard of a post.

use std::collections::BTreeSet;

use postdeck_model::{ButtonSpec, KeyboardLayout};

use crate::metadata::{FALLBACK_QUALITY, GroupKey};

/// Quality labels that get their own prominent row, in display order.
pub const CANONICAL_QUALITIES: [&str; 3] = ["480p", "720p", "1080p"];

/// Widest episode row: the episode marker plus four quality buttons.
pub const MAX_ROW_WIDTH: usize = 5;

pub const TUTORIAL_LABEL: &str = "ℹ️ How to Download";

/// One group of the session together with its public link and the quality
/// labels uploaded into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedGroup {
    pub key: GroupKey,
    pub link: String,
    pub qualities: Vec<String>,
}

/// Insertion-ordered group links. A key is inserted once; later uploads can
/// only add quality labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupLinks {
    entries: Vec<LinkedGroup>,
}

impl GroupLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&LinkedGroup> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    pub fn contains(&self, key: &GroupKey) -> bool {
        self.get(key).is_some()
    }

    /// Insert a new group. Returns `false` and leaves the existing link alone
    /// when the key is already present.
    pub fn insert_new(&mut self, key: GroupKey, link: String, quality: impl Into<String>) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.entries.push(LinkedGroup {
            key,
            link,
            qualities: vec![quality.into()],
        });
        true
    }

    /// Record another quality for an existing group.
    pub fn add_quality(&mut self, key: &GroupKey, quality: &str) -> bool {
        match self.entries.iter_mut().find(|entry| &entry.key == key) {
            Some(entry) => {
                if !entry.qualities.iter().any(|q| q == quality) {
                    entry.qualities.push(quality.to_string());
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkedGroup> {
        self.entries.iter()
    }

    /// The last `count` groups in insertion order.
    pub fn recent(&self, count: usize) -> &[LinkedGroup] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }
}

/// Compiler output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLayout {
    pub keyboard: KeyboardLayout,
    /// First episode left out because of the button ceiling.
    pub omitted_from: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutCompiler {
    max_buttons: usize,
}

impl Default for LayoutCompiler {
    fn default() -> Self {
        Self::new()
    }
}

struct EpisodeGroup<'a> {
    season: u32,
    episode: u32,
    group: &'a LinkedGroup,
}

impl LayoutCompiler {
    /// Platform ceiling on buttons in a single message.
    pub const MAX_BUTTONS: usize = 90;

    pub fn new() -> Self {
        Self {
            max_buttons: Self::MAX_BUTTONS,
        }
    }

    pub fn with_max_buttons(max_buttons: usize) -> Self {
        Self {
            max_buttons: max_buttons.max(1),
        }
    }

    pub fn max_buttons(&self) -> usize {
        self.max_buttons
    }

    /// Build the keyboard. The total button count never exceeds the ceiling,
    /// standard rows precede episode rows, and the output does not depend on
    /// the insertion order of `groups`.
    pub fn compile(&self, groups: &GroupLinks, tutorial_url: Option<&str>) -> CompiledLayout {
        let ceiling = self
            .max_buttons
            .saturating_sub(usize::from(tutorial_url.is_some()));

        let mut standard: Vec<&LinkedGroup> = Vec::new();
        let mut episodes: Vec<EpisodeGroup<'_>> = Vec::new();
        for group in groups.iter() {
            match group.key.episode() {
                Some((season, episode)) => episodes.push(EpisodeGroup {
                    season,
                    episode,
                    group,
                }),
                None => standard.push(group),
            }
        }

        standard.sort_by(|a, b| {
            standard_rank(a.key.as_str())
                .cmp(&standard_rank(b.key.as_str()))
                .then_with(|| a.key.as_str().cmp(b.key.as_str()))
        });
        episodes.sort_by_key(|e| (e.episode, e.season));

        let mut keyboard = KeyboardLayout::new();
        let mut total = 0usize;

        // Keep one slot free for the warning button while episodes follow.
        let standard_ceiling = if episodes.is_empty() {
            ceiling
        } else {
            ceiling.saturating_sub(1)
        };
        for group in standard {
            if total >= standard_ceiling {
                break;
            }
            keyboard.push_row(vec![ButtonSpec::link(
                standard_label(group.key.as_str()),
                group.link.clone(),
            )]);
            total += 1;
        }

        let multi_season = episodes
            .iter()
            .map(|e| e.season)
            .collect::<BTreeSet<_>>()
            .len()
            > 1;

        let mut omitted_from = None;
        let episode_count = episodes.len();
        for (index, entry) in episodes.iter().enumerate() {
            let row = episode_row(entry, multi_season);
            let is_last = index + 1 == episode_count;
            let needed = if is_last { row.len() } else { row.len() + 1 };

            if total + needed > ceiling {
                if total < ceiling {
                    keyboard.push_row(vec![ButtonSpec::marker(format!(
                        "⚠️ Limit Reached ({}+)",
                        episode_name(entry, multi_season)
                    ))]);
                }
                omitted_from = Some(entry.episode);
                break;
            }

            total += row.len();
            keyboard.push_row(row);
        }

        if let Some(url) = tutorial_url {
            keyboard.push_row(vec![ButtonSpec::link(TUTORIAL_LABEL, url)]);
        }

        CompiledLayout {
            keyboard,
            omitted_from,
        }
    }
}

fn episode_name(entry: &EpisodeGroup<'_>, multi_season: bool) -> String {
    if multi_season {
        format!("S{} E{}", entry.season, entry.episode)
    } else {
        format!("Ep {}", entry.episode)
    }
}

fn episode_row(entry: &EpisodeGroup<'_>, multi_season: bool) -> Vec<ButtonSpec> {
    let mut row = vec![ButtonSpec::marker(format!(
        "🎬 {}",
        episode_name(entry, multi_season)
    ))];

    let mut qualities: Vec<&str> = entry.group.qualities.iter().map(String::as_str).collect();
    if qualities.is_empty() {
        qualities.push(FALLBACK_QUALITY);
    }
    qualities.sort_by(|a, b| standard_rank(a).cmp(&standard_rank(b)).then_with(|| a.cmp(b)));
    qualities.dedup();

    for quality in qualities {
        if row.len() >= MAX_ROW_WIDTH {
            break;
        }
        row.push(ButtonSpec::link(quality, entry.group.link.clone()));
    }
    row
}

/// Sort rank: canonical qualities in order, then labels ending in a number
/// (ascending), then everything else.
fn standard_rank(label: &str) -> (u8, u64) {
    if let Some(position) = CANONICAL_QUALITIES.iter().position(|q| *q == label) {
        return (0, position as u64);
    }
    match last_number(label) {
        Some(number) => (1, number),
        None => (2, 0),
    }
}

fn last_number(label: &str) -> Option<u64> {
    label
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .next_back()
        .and_then(|run| run.parse().ok())
}

fn standard_label(key: &str) -> String {
    if CANONICAL_QUALITIES.contains(&key) {
        format!("📥 Download {key}")
    } else if key.contains("Episode") {
        key.replace("Episode", "Ep")
    } else {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postdeck_model::ButtonTarget;

    fn links(entries: &[(&str, &[&str])]) -> GroupLinks {
        let mut groups = GroupLinks::new();
        for (key, qualities) in entries {
            let key = GroupKey::new(*key);
            let link = format!("https://l/{}", key.as_str().replace(' ', "_"));
            groups.insert_new(key.clone(), link, qualities[0]);
            for q in &qualities[1..] {
                groups.add_quality(&key, q);
            }
        }
        groups
    }

    fn labels(layout: &KeyboardLayout) -> Vec<Vec<String>> {
        layout
            .rows()
            .iter()
            .map(|row| row.iter().map(|b| b.label.clone()).collect())
            .collect()
    }

    #[test]
    fn insert_new_never_replaces_a_link() {
        let mut groups = GroupLinks::new();
        assert!(groups.insert_new(GroupKey::new("480p"), "a".into(), "480p"));
        assert!(!groups.insert_new(GroupKey::new("480p"), "b".into(), "480p"));
        assert_eq!(groups.get(&GroupKey::new("480p")).unwrap().link, "a");
    }

    #[test]
    fn standard_rows_follow_canonical_then_numeric_order() {
        let groups = links(&[
            ("Zip File", &["Zip File"]),
            ("1080p", &["1080p"]),
            ("Part 10", &["Part 10"]),
            ("480p", &["480p"]),
            ("Part 2", &["Part 2"]),
            ("Episode 4", &["Episode 4"]),
        ]);
        let compiled = LayoutCompiler::new().compile(&groups, None);
        assert_eq!(
            labels(&compiled.keyboard),
            vec![
                vec!["📥 Download 480p"],
                vec!["📥 Download 1080p"],
                vec!["Part 2"],
                vec!["Ep 4"],
                vec!["Part 10"],
                vec!["Zip File"],
            ]
        );
    }

    #[test]
    fn episode_rows_start_with_a_marker() {
        let groups = links(&[("S1 E2", &["2160p", "720p", "480p"])]);
        let compiled = LayoutCompiler::new().compile(&groups, None);
        let row = &compiled.keyboard.rows()[0];
        assert_eq!(row[0].target, ButtonTarget::Marker);
        assert_eq!(
            labels(&compiled.keyboard)[0],
            vec!["🎬 Ep 2", "480p", "720p", "2160p"]
        );
        assert!(row[1..].iter().all(|b| b.target == ButtonTarget::Link("https://l/S1_E2".into())));
    }

    #[test]
    fn episode_rows_are_capped_at_five_buttons() {
        let groups = links(&[(
            "S1 E1",
            &["480p", "720p", "1080p", "2160p", "4K HDR", "CAM"],
        )]);
        let compiled = LayoutCompiler::new().compile(&groups, None);
        assert_eq!(compiled.keyboard.rows()[0].len(), MAX_ROW_WIDTH);
    }

    #[test]
    fn seasons_are_named_when_more_than_one_is_present() {
        let groups = links(&[("S2 E1", &["480p"]), ("S1 E1", &["480p"])]);
        let compiled = LayoutCompiler::new().compile(&groups, None);
        assert_eq!(
            labels(&compiled.keyboard),
            vec![vec!["🎬 S1 E1", "480p"], vec!["🎬 S2 E1", "480p"]]
        );
    }

    #[test]
    fn tutorial_row_comes_last() {
        let groups = links(&[("720p", &["720p"])]);
        let compiled = LayoutCompiler::new().compile(&groups, Some("https://help"));
        let rows = compiled.keyboard.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], ButtonSpec::link(TUTORIAL_LABEL, "https://help"));
    }

    #[test]
    fn last_number_reads_trailing_digit_run() {
        assert_eq!(last_number("Part 2 of 10"), Some(10));
        assert_eq!(last_number("Zip"), None);
    }
}
