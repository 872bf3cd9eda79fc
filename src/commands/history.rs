//! View locally stored practice results.

use crate::practice::HistoryManager;
use console::style;

/// Handles the practice history view.
///
/// Lists analyzed practice sessions, most recent first.
///
/// # Errors
/// - If the history database cannot be opened or read
pub fn handle_history() -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Practice History ===");

    let mut history = HistoryManager::open_default()?;
    let sessions = history.get_all_sessions()?;

    if sessions.is_empty() {
        println!("No practice sessions yet. Run `speakai practice` to get started.");
        return Ok(());
    }

    println!();
    println!(
        "  {}",
        style(format!("{} practice sessions", sessions.len())).bold()
    );
    println!();

    for entry in &sessions {
        println!(
            "  {}  {}",
            style(entry.created_at.format("%Y-%m-%d %H:%M")).dim(),
            style(&entry.article_title).bold(),
        );
        println!(
            "      pronunciation {}/10, fluency {}/10",
            entry.pronunciation_score, entry.fluency_score
        );
        println!("      {}", style(truncate(&entry.feedback, 90)).dim());
        println!();
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_feedback_is_untouched() {
        assert_eq!(truncate("well done", 90), "well done");
    }

    #[test]
    fn long_feedback_is_cut_at_char_boundary() {
        let long = "a".repeat(200);
        let cut = truncate(&long, 90);
        assert_eq!(cut.chars().count(), 93);
        assert!(cut.ends_with("..."));
    }
}
