//! Text rendering for menus and the end-of-session report.

use crate::engine::MistakeSummary;
use crate::preprocessing::{Catalog, Scene};

/// `1. <entry>` lines for every option of `C`, newline-terminated.
pub fn render_menu<C, F>(describe: F) -> String
where
    C: Catalog,
    F: Fn(&C) -> String,
{
    C::ALL
        .iter()
        .enumerate()
        .map(|(i, option)| format!("{}. {}\n", i + 1, describe(option)))
        .collect()
}

pub fn describe_scene(scene: &Scene) -> String {
    format!("{}: {}", scene.label(), scene.description())
}

pub fn render_summary(summary: &MistakeSummary) -> String {
    let mut out = String::from("\n--- Mistake Summary ---\n\nMistake Types:\n");
    for (category, count) in &summary.by_category {
        out.push_str(&format!("- {}: {}\n", category, count));
    }

    if !summary.focus.is_empty() {
        out.push_str("\nTop Mistakes to Focus On:\n");
        for mistake in &summary.focus {
            out.push_str(&format!(
                "- {} ({})\n",
                mistake.correction_pair(),
                mistake.category
            ));
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Importance, MistakeRecord};
    use crate::preprocessing::Language;

    #[test]
    fn menu_is_numbered_from_one() {
        let menu = render_menu::<Language, _>(|l| l.label().to_string());
        assert!(menu.starts_with("1. Spanish\n2. French\n"));
        assert!(menu.ends_with("15. Polish\n"));
    }

    #[test]
    fn scene_entries_carry_descriptions() {
        let menu = render_menu::<Scene, _>(describe_scene);
        assert!(menu.starts_with(
            "1. Restaurant: You are at a restaurant ordering food and chatting with the waiter/waitress.\n"
        ));
        assert!(menu.contains("6. Job Interview: "));
    }

    #[test]
    fn summary_lists_categories_and_focus() {
        let summary = MistakeSummary {
            total: 3,
            by_category: vec![("grammar".to_string(), 2), ("idiom".to_string(), 1)],
            focus: vec![MistakeRecord::new("yo es", "yo soy", "grammar", Importance::CRITICAL)],
        };

        assert_eq!(
            render_summary(&summary),
            "\n--- Mistake Summary ---\n\nMistake Types:\n- grammar: 2\n- idiom: 1\n\n\
             Top Mistakes to Focus On:\n- yo es → yo soy (grammar)"
        );
    }

    #[test]
    fn summary_without_focus_omits_section() {
        let summary = MistakeSummary {
            total: 1,
            by_category: vec![("spelling".to_string(), 1)],
            focus: Vec::new(),
        };
        assert!(!render_summary(&summary).contains("Top Mistakes"));
    }
}
