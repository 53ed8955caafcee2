use postdeck_core::layout::{GroupLinks, LayoutCompiler, TUTORIAL_LABEL};
use postdeck_core::metadata::GroupKey;
use postdeck_model::{ButtonTarget, KeyboardLayout};

fn season_one(episodes: u32) -> GroupLinks {
    let mut groups = GroupLinks::new();
    for episode in 1..=episodes {
        groups.insert_new(
            GroupKey::episodic(1, episode),
            format!("https://t.me/deck_bot?start=Ep{episode:06}"),
            "720p",
        );
    }
    groups
}

fn labels(layout: &KeyboardLayout) -> Vec<String> {
    layout.buttons().map(|b| b.label.clone()).collect()
}

#[test]
fn forty_five_single_quality_episodes_fill_the_ceiling_exactly() {
    let compiled = LayoutCompiler::new().compile(&season_one(45), None);

    assert_eq!(compiled.keyboard.button_count(), LayoutCompiler::MAX_BUTTONS);
    assert_eq!(compiled.omitted_from, None);
    assert!(
        !labels(&compiled.keyboard)
            .iter()
            .any(|label| label.starts_with("⚠️"))
    );
}

#[test]
fn one_more_episode_is_replaced_by_a_warning() {
    let compiled = LayoutCompiler::new().compile(&season_one(46), None);

    assert!(compiled.keyboard.button_count() <= LayoutCompiler::MAX_BUTTONS);
    assert_eq!(compiled.omitted_from, Some(45));

    let last_row = compiled.keyboard.rows().last().unwrap();
    assert_eq!(last_row.len(), 1);
    assert_eq!(last_row[0].label, "⚠️ Limit Reached (Ep 45+)");
    assert!(!last_row[0].is_interactive());
}

#[test]
fn tutorial_button_survives_a_full_keyboard() {
    let compiled =
        LayoutCompiler::new().compile(&season_one(60), Some("https://example.com/how-to"));

    assert!(compiled.keyboard.button_count() <= LayoutCompiler::MAX_BUTTONS);
    let last_row = compiled.keyboard.rows().last().unwrap();
    assert_eq!(last_row[0].label, TUTORIAL_LABEL);
    assert_eq!(
        last_row[0].target,
        ButtonTarget::Link("https://example.com/how-to".into())
    );
}

#[test]
fn insertion_order_does_not_change_the_keyboard() {
    let entries = [
        (GroupKey::episodic(1, 2), "https://s.ex/2", "1080p"),
        (GroupKey::new("720p"), "https://s.ex/hd", "720p"),
        (GroupKey::episodic(1, 1), "https://s.ex/1", "480p"),
        (GroupKey::new("Zip File"), "https://s.ex/zip", "Zip File"),
        (GroupKey::new("480p"), "https://s.ex/sd", "480p"),
    ];

    let mut forward = GroupLinks::new();
    for (key, link, quality) in entries.iter().cloned() {
        forward.insert_new(key, link.to_string(), quality);
    }
    let mut backward = GroupLinks::new();
    for (key, link, quality) in entries.iter().rev().cloned() {
        backward.insert_new(key, link.to_string(), quality);
    }

    let compiler = LayoutCompiler::new();
    let a = compiler.compile(&forward, None);
    let b = compiler.compile(&backward, None);
    assert_eq!(a, b);

    assert_eq!(
        labels(&a.keyboard),
        vec![
            "📥 Download 480p",
            "📥 Download 720p",
            "Zip File",
            "🎬 Ep 1",
            "480p",
            "🎬 Ep 2",
            "1080p",
        ]
    );
}
