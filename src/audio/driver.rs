//! Audio resource handles and the driver seam.
//!
//! The session owns at most one live audio resource at a time. Each kind of
//! resource (capture stream, playback stream, speech synthesis) is held
//! behind a small trait so the session state machine can be exercised in
//! tests without touching real devices. The production driver wires these
//! to cpal, ffmpeg, and the system text-to-speech engine.

use crate::audio::player::Player;
use crate::audio::recorder::Recorder;
use crate::audio::speech::SpeechSynth;
use crate::config::AudioConfig;
use anyhow::Result;
use std::path::Path;

/// A microphone capture in progress.
pub trait CaptureHandle {
    /// Stops capture and encodes the take into `output` using the given
    /// format string ("codec [ffmpeg options]").
    fn finish(&mut self, output: &Path, format: &str) -> Result<()>;

    /// Stops capture and discards the samples.
    fn abort(&mut self);
}

/// A loaded playable artifact.
pub trait PlaybackHandle {
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    /// Whether playback has reached the end of the artifact.
    fn finished(&self) -> bool;
    /// Moves the playback position back to zero.
    fn rewind(&mut self);
    /// Stops playback and releases the underlying stream.
    fn stop(&mut self);
}

/// A running read-aloud synthesis.
pub trait SpeechHandle {
    /// Whether the synthesis has run to completion on its own.
    fn finished(&mut self) -> bool;
    /// Stops the synthesis immediately.
    fn stop(&mut self);
}

/// Factory for the three audio resource kinds.
pub trait AudioDriver {
    fn open_recorder(&self) -> Result<Box<dyn CaptureHandle>>;
    fn open_player(&self, artifact: &Path) -> Result<Box<dyn PlaybackHandle>>;
    fn open_speech(&self, text: &str) -> Result<Box<dyn SpeechHandle>>;
}

/// Production driver backed by cpal and the system TTS engine.
pub struct SystemAudioDriver {
    audio: AudioConfig,
}

impl SystemAudioDriver {
    pub fn new(audio: AudioConfig) -> Self {
        Self { audio }
    }
}

impl AudioDriver for SystemAudioDriver {
    fn open_recorder(&self) -> Result<Box<dyn CaptureHandle>> {
        let recorder = Recorder::start(&self.audio.device, self.audio.sample_rate)?;
        Ok(Box::new(recorder))
    }

    fn open_player(&self, artifact: &Path) -> Result<Box<dyn PlaybackHandle>> {
        let player = Player::load(artifact)?;
        Ok(Box::new(player))
    }

    fn open_speech(&self, text: &str) -> Result<Box<dyn SpeechHandle>> {
        let synth = SpeechSynth::speak(text, self.audio.speech_rate)?;
        Ok(Box::new(synth))
    }
}
