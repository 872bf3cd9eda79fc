//! Daily reading practice.
//!
//! Shows today's article, lets the user hear it read aloud, record a take,
//! replay it, and submit it for analysis. Analyzed sessions are saved to the
//! local history database.

use crate::api::models::{AnalysisResult, ReadingResult};
use crate::api::{AnalysisKind, ApiClient, SubmissionClient, TcpConnectivity};
use crate::audio::{AudioSession, Phase, SystemAudioDriver};
use crate::config::SpeakaiConfig;
use crate::practice::{article_of_the_day, Article, HistoryManager};
use console::{style, Key, Term};
use std::time::Duration;

/// Handles the reading-practice session.
///
/// # Errors
/// - If audio capture cannot be started
/// - If terminal input fails
/// - If the history database cannot be opened
pub async fn handle_practice(
    config: &SpeakaiConfig,
    api: &ApiClient,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Reading Practice ===");

    let article = article_of_the_day();
    let mut history = HistoryManager::open_default()?;

    print_article(article);
    print_controls();

    let driver = SystemAudioDriver::new(config.audio.clone());
    let mut audio = AudioSession::new(Box::new(driver), &config.audio.output_format);
    let term = Term::stdout();

    loop {
        audio.refresh();

        match term.read_key()? {
            Key::Char('r') => {
                let started = audio.toggle_read_aloud(article.content)?;
                if started {
                    println!("{}", style("Reading aloud... press r to stop.").cyan());
                } else {
                    println!("{}", style("Read-aloud stopped.").dim());
                }
            }
            Key::Char(' ') => {
                if audio.phase() == Phase::Recording {
                    if audio.stop_recording()?.is_some() {
                        println!(
                            "Recorded {}s. Press {} to replay or {} to analyze.",
                            audio.elapsed_seconds(),
                            style("p").bold(),
                            style("a").bold(),
                        );
                    }
                } else {
                    audio.start_recording()?;
                    println!("{}", style("Recording... press Space to stop.").red());
                }
            }
            Key::Char('p') => {
                if let Err(e) = audio.toggle_playback() {
                    println!("{}", style(e).yellow());
                }
            }
            Key::Char('x') => {
                audio.reset();
                println!("{}", style("Take discarded.").dim());
            }
            Key::Char('a') => {
                if audio.phase() == Phase::Recording && audio.stop_recording()?.is_none() {
                    continue;
                }
                let Some(artifact) = audio.artifact().cloned() else {
                    println!("{}", style("Record a take first (Space).").yellow());
                    continue;
                };
                if audio.phase() == Phase::Playing {
                    let _ = audio.toggle_playback();
                }

                let spinner = cliclack::spinner();
                spinner.start("Analyzing your reading...");

                let client = SubmissionClient::new(
                    api,
                    Box::new(TcpConnectivity::new()),
                    Duration::from_secs(config.server.upload_timeout_secs),
                );
                match client.submit(&artifact, AnalysisKind::Reading).await {
                    Ok(AnalysisResult::Reading(result)) => {
                        spinner.stop("Analysis complete");
                        render_reading(&result);
                        if let Err(e) = history.save_session(
                            article.title,
                            result.pronunciation_score,
                            result.fluency_score,
                            &result.feedback,
                        ) {
                            tracing::warn!("Failed to save practice history: {e}");
                        }
                        break;
                    }
                    Ok(AnalysisResult::Intro(_)) => {
                        spinner.error("Unexpected response");
                        return Err(anyhow::anyhow!(
                            "Server returned an introduction analysis for a reading upload"
                        ));
                    }
                    Err(e) => {
                        spinner.error("Analysis failed");
                        println!("{}", style(&e).yellow());
                        println!(
                            "Press {} to retry, {} to re-record, or {} to quit.",
                            style("a").bold(),
                            style("Space").bold(),
                            style("q").bold(),
                        );
                    }
                }
            }
            Key::Char('q') | Key::Escape => {
                println!("{}", style("Practice session ended.").dim());
                break;
            }
            _ => {}
        }
    }

    audio.reset();
    Ok(())
}

fn print_article(article: &Article) {
    println!();
    println!("  {}", style(article.title).bold().underlined());
    println!();
    for line in textwrap(article.content, 76) {
        println!("  {line}");
    }
    println!();
    println!("  {}", style(format!("{} words", article.word_count())).dim());
    println!();
}

fn print_controls() {
    println!(
        "  {}  read aloud    {}  record    {}  replay    {}  discard    {}  analyze    {}  quit",
        style("r").bold(),
        style("Space").bold(),
        style("p").bold(),
        style("x").bold(),
        style("a").bold(),
        style("q").bold(),
    );
    println!();
}

/// Renders scores, highlighted transcription errors, and improvement areas.
fn render_reading(result: &ReadingResult) {
    println!();
    println!(
        "  Pronunciation  {}",
        super::intro::render_score(result.pronunciation_score, 10)
    );
    println!(
        "  Fluency        {}",
        super::intro::render_score(result.fluency_score, 10)
    );
    println!();
    println!("  {}", style(&result.feedback).italic());
    println!();

    let errors = &result.text_with_errors.errors;
    if !errors.is_empty() {
        println!("  {}", style("What we heard:").bold());
        for line in textwrap(&result.text_with_errors.full_text, 76) {
            println!("  {line}");
        }
        println!();
        println!("  {}", style("Corrections:").bold());
        for error in errors {
            println!(
                "    {} {} {}  {}",
                style(&error.incorrect).red().strikethrough(),
                style("->").dim(),
                style(&error.correction).green(),
                style(format!("({})", error.kind)).dim(),
            );
        }
        println!();
    }

    if !result.areas_to_improve.is_empty() {
        println!("  {}", style("Areas to improve:").bold());
        for (area, phrases) in &result.areas_to_improve {
            println!("    {}: {}", style(area).cyan(), phrases.join(", "));
        }
        println!();
    }

    if !result.key_errors.is_empty() {
        println!("  {}", style("Key errors:").bold());
        for key_error in &result.key_errors {
            println!("    - {key_error}");
        }
        println!();
    }
}

/// Greedy word wrap at the given display width.
fn textwrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_words_intact() {
        let lines = textwrap("one two three four five six seven", 10);
        assert!(lines.iter().all(|l| l.len() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six seven");
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert!(textwrap("", 40).is_empty());
    }
}
