//! Review playback of a recorded artifact.
//!
//! The artifact is decoded back to mono PCM at the output device's native
//! rate (via ffmpeg), then streamed through a cpal output stream. The
//! stream is created paused at position zero; pause/resume map directly to
//! the cpal stream, and the playback position is shared with the audio
//! callback so the session can detect end-of-track.

use crate::audio::driver::PlaybackHandle;
use crate::audio::encode;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A loaded, playable artifact.
pub struct Player {
    stream: Option<cpal::Stream>,
    /// Next sample index to be written to the device, shared with the callback
    position: Arc<AtomicUsize>,
    total_samples: usize,
}

impl Player {
    /// Decodes the artifact and prepares a paused output stream at position zero.
    ///
    /// # Errors
    /// - If no output device is available
    /// - If the artifact cannot be decoded
    /// - If the output stream cannot be created
    pub fn load(artifact: &Path) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device available"))?;
        let device_config = device.default_output_config()?;
        let sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;

        // Decode at the device rate so no resampling is needed here.
        let temp_wav =
            std::env::temp_dir().join(format!("speakai_play_{}.wav", std::process::id()));
        encode::decode_to_wav(artifact, &temp_wav, sample_rate)?;

        let mut reader = hound::WavReader::open(&temp_wav)?;
        let samples: Vec<f32> = reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
            .collect::<Result<_, _>>()?;

        if let Err(e) = std::fs::remove_file(&temp_wav) {
            tracing::debug!("Failed to remove temp file: {}", e);
        }

        let total_samples = samples.len();
        let samples = Arc::new(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let callback_position = Arc::clone(&position);

        let stream = device.build_output_stream(
            &device_config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = callback_position.load(Ordering::Acquire);
                for frame in data.chunks_mut(channels) {
                    let value = samples.get(pos).copied().unwrap_or(0.0);
                    for out in frame.iter_mut() {
                        *out = value;
                    }
                    if pos < samples.len() {
                        pos += 1;
                    }
                }
                callback_position.store(pos, Ordering::Release);
            },
            |err| {
                tracing::error!("Playback stream error: {}", err);
            },
            None,
        )?;

        // Created paused; playback starts only on an explicit play()
        stream.pause()?;

        tracing::debug!(
            "Artifact loaded for playback: {} ({} samples at {}Hz)",
            artifact.display(),
            total_samples,
            sample_rate
        );

        Ok(Self {
            stream: Some(stream),
            position,
            total_samples,
        })
    }
}

impl PlaybackHandle for Player {
    fn play(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| anyhow!("Playback stream already released"))?;
        stream.play()?;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| anyhow!("Playback stream already released"))?;
        stream.pause()?;
        Ok(())
    }

    fn finished(&self) -> bool {
        self.position.load(Ordering::Acquire) >= self.total_samples
    }

    fn rewind(&mut self) {
        self.position.store(0, Ordering::Release);
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::debug!("Failed to pause stream on release: {}", e);
            }
            tracing::debug!("Playback stream released");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}
