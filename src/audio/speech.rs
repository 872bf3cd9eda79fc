//! Read-aloud via the system text-to-speech engine.
//!
//! Spawns the platform's speech synthesizer as a child process:
//! `say` on macOS, or the first of `espeak-ng`, `espeak`, `spd-say` found
//! on Linux. The child is killed on stop so read-aloud can be interrupted
//! at any time.

use crate::audio::driver::SpeechHandle;
use anyhow::{anyhow, Result};
use std::process::{Child, Command, Stdio};

/// A running speech synthesis process.
pub struct SpeechSynth {
    child: Option<Child>,
}

impl SpeechSynth {
    /// Starts speaking the given text at the given rate (words per minute).
    ///
    /// # Errors
    /// - If no text-to-speech engine is installed
    pub fn speak(text: &str, rate_wpm: u32) -> Result<Self> {
        let child = spawn_engine(text, rate_wpm)?;
        tracing::debug!("Read-aloud started ({} chars)", text.len());
        Ok(Self { child: Some(child) })
    }
}

/// Tries the platform speech engines in order of preference.
fn spawn_engine(text: &str, rate_wpm: u32) -> Result<Child> {
    #[cfg(target_os = "macos")]
    {
        if let Ok(child) = Command::new("say")
            .arg("-r")
            .arg(rate_wpm.to_string())
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            return Ok(child);
        }
    }

    // espeak-ng and espeak share the -s (speed, wpm) flag
    for engine in ["espeak-ng", "espeak"] {
        if let Ok(child) = Command::new(engine)
            .arg("-s")
            .arg(rate_wpm.to_string())
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            return Ok(child);
        }
    }

    // spd-say uses a -100..100 relative rate; map wpm around a 160 baseline
    let relative_rate = ((rate_wpm as i64 - 160) / 2).clamp(-100, 100);
    if let Ok(child) = Command::new("spd-say")
        .arg("--wait")
        .arg("-r")
        .arg(relative_rate.to_string())
        .arg(text)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        return Ok(child);
    }

    Err(anyhow!(
        "No text-to-speech engine found. Install espeak-ng (Linux) or use macOS 'say'."
    ))
}

impl SpeechHandle for SpeechSynth {
    fn finished(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => true,
        }
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            // Already-exited children make kill() fail; that's fine
            if let Err(e) = child.kill() {
                tracing::debug!("Speech process already gone: {}", e);
            }
            let _ = child.wait();
            tracing::debug!("Read-aloud stopped");
        }
    }
}

impl Drop for SpeechSynth {
    fn drop(&mut self) {
        self.stop();
    }
}
