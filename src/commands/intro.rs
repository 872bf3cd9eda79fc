//! Self-introduction recording and analysis.
//!
//! Records a short free-form introduction, submits it for analysis and marks
//! the introduction as completed on success. Controls mirror the practice
//! screen: Space toggles recording, p replays the take, Enter submits.

use crate::api::models::AnalysisResult;
use crate::api::{AnalysisKind, ApiClient, SubmissionClient, TcpConnectivity};
use crate::audio::{AudioSession, Phase, SystemAudioDriver};
use crate::auth::AuthSession;
use crate::config::SpeakaiConfig;
use cliclack::{intro, note};
use console::{style, Key, Term};
use std::time::Duration;

/// Handles the self-introduction flow.
///
/// # Errors
/// - If audio capture cannot be started
/// - If terminal input fails
pub async fn handle_intro(
    config: &SpeakaiConfig,
    api: &ApiClient,
    session: &AuthSession,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Self-Introduction ===");

    intro(style(" self-introduction ").on_white().black())?;
    note(
        "Tips",
        "Say your name, where you are from, what you do and what you enjoy.\n\
         Aim for 30 to 60 seconds of natural speech.",
    )?;

    if session.intro_completed() {
        println!(
            "{}",
            style("You already completed an introduction; a new one replaces its scores.").dim()
        );
    }

    let driver = SystemAudioDriver::new(config.audio.clone());
    let mut audio = AudioSession::new(Box::new(driver), &config.audio.output_format);
    let term = Term::stdout();

    println!(
        "  {}  start/stop recording    {}  replay    {}  submit    {}  cancel",
        style("Space").bold(),
        style("p").bold(),
        style("Enter").bold(),
        style("q").bold(),
    );

    loop {
        audio.refresh();

        match term.read_key()? {
            Key::Char(' ') => {
                if audio.phase() == Phase::Recording {
                    if audio.stop_recording()?.is_some() {
                        println!(
                            "Recorded {}s. Press {} to submit or {} to re-record.",
                            audio.elapsed_seconds(),
                            style("Enter").bold(),
                            style("Space").bold(),
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
            Key::Enter => {
                if audio.phase() == Phase::Recording {
                    // Finish the take first, then submit it.
                    if audio.stop_recording()?.is_none() {
                        continue;
                    }
                }
                let Some(artifact) = audio.artifact().cloned() else {
                    println!("{}", style("Nothing recorded yet.").yellow());
                    continue;
                };
                if audio.phase() == Phase::Playing {
                    let _ = audio.toggle_playback();
                }

                let spinner = cliclack::spinner();
                spinner.start("Analyzing your introduction...");

                let client = SubmissionClient::new(
                    api,
                    Box::new(TcpConnectivity::new()),
                    Duration::from_secs(config.server.upload_timeout_secs),
                );
                match client.submit(&artifact, AnalysisKind::Intro).await {
                    Ok(AnalysisResult::Intro(result)) => {
                        spinner.stop("Analysis complete");
                        session.mark_intro_completed()?;

                        // Intro scores come back on a 0-100 scale.
                        println!();
                        println!("  Fluency        {}", render_score(result.fluency, 100));
                        println!(
                            "  Pronunciation  {}",
                            render_score(result.pronunciation, 100)
                        );
                        println!("  Vocabulary     {}", render_score(result.vocabulary, 100));
                        println!("  Overall        {}", render_score(result.overall, 100));
                        println!();
                        println!("  {}", style(&result.feedback).italic());
                        break;
                    }
                    Ok(AnalysisResult::Reading(_)) => {
                        spinner.error("Unexpected response");
                        return Err(anyhow::anyhow!(
                            "Server returned a reading analysis for an introduction upload"
                        ));
                    }
                    Err(e) => {
                        spinner.error("Analysis failed");
                        println!("{}", style(&e).yellow());
                        println!(
                            "Press {} to try again or {} to cancel.",
                            style("Enter").bold(),
                            style("q").bold(),
                        );
                    }
                }
            }
            Key::Char('q') | Key::Escape => {
                println!("{}", style("Introduction cancelled.").dim());
                break;
            }
            _ => {}
        }
    }

    audio.reset();
    Ok(())
}

/// Renders a score as a ten-segment colored bar with the numeric value.
pub(crate) fn render_score(score: u8, max: u8) -> String {
    let filled = (usize::from(score.min(max)) * 10 / usize::from(max.max(1))).min(10);
    let bar: String = "█".repeat(filled) + &"░".repeat(10 - filled);
    let colored = match filled {
        0..=4 => style(bar).red(),
        5..=7 => style(bar).yellow(),
        _ => style(bar).green(),
    };
    format!("{colored} {score}/{max}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bar_scales_to_ten_segments() {
        assert!(render_score(85, 100).contains("85/100"));
        assert!(render_score(8, 10).contains("8/10"));
        // 85/100 and 8/10 fill the same number of segments
        let full = render_score(100, 100);
        assert!(full.contains("██████████"));
        assert!(!full.contains('░'));
    }

    #[test]
    fn score_bar_clamps_out_of_range_values() {
        assert!(render_score(14, 10).contains("14/10"));
        assert!(render_score(0, 10).contains("░░░░░░░░░░"));
    }
}
