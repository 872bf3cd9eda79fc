//! Microphone capture.
//!
//! Captures i16 PCM from the configured input device, mixing multi-channel
//! audio down to mono. A finished take is written to a temporary WAV file
//! and encoded to the upload format with ffmpeg.

use crate::audio::driver::CaptureHandle;
use crate::audio::encode;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// An in-progress microphone capture.
///
/// The cpal stream is kept alive for the lifetime of the recorder; dropping
/// the recorder stops capture and releases the device.
pub struct Recorder {
    /// Actual recording sample rate from the device
    sample_rate: u32,
    /// Recorded audio samples (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active audio input stream (kept alive during recording)
    stream: Option<cpal::Stream>,
}

impl Recorder {
    /// Opens the input device and starts capturing immediately.
    ///
    /// The actual sample rate may differ from the requested one depending on
    /// device capabilities; the WAV header uses the actual rate.
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If device configuration fails
    /// - If audio stream creation fails
    pub fn start(device_name: &str, requested_sample_rate: u32) -> Result<Self> {
        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            if device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_input_device(&host, device_name)
            }
        })?;

        let resolved_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", resolved_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if sample_rate != requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                requested_sample_rate,
                sample_rate
            );
        }

        let samples = Arc::new(Mutex::new(Vec::new()));
        let samples_arc = Arc::clone(&samples);

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                mix_to_mono(data, &samples_arc, num_channels);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        tracing::debug!(
            "Capture started: {}Hz, {} channels",
            sample_rate,
            num_channels
        );

        Ok(Self {
            sample_rate,
            samples,
            stream: Some(stream),
        })
    }

    /// Writes the captured samples as an uncompressed PCM WAV file.
    fn save_wav(&self, samples: &[i16], path: &Path) -> Result<()> {
        let wav_spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, wav_spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        tracing::debug!("Temporary WAV created: {}", path.display());
        Ok(())
    }
}

impl CaptureHandle for Recorder {
    fn finish(&mut self, output: &Path, format: &str) -> Result<()> {
        // Stop the audio stream before reading the buffer
        self.stream = None;

        let samples = self.samples.lock().unwrap().clone();
        if samples.is_empty() {
            return Err(anyhow!("No audio captured"));
        }

        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Capture stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        let temp_wav = std::env::temp_dir().join(format!("speakai_{}.wav", std::process::id()));
        self.save_wav(&samples, &temp_wav)?;
        let encode_result = encode::encode_wav(&temp_wav, output, format);

        if let Err(e) = std::fs::remove_file(&temp_wav) {
            tracing::debug!("Failed to remove temp file: {}", e);
        }
        encode_result?;

        let file_size = std::fs::metadata(output)?.len();
        tracing::info!(
            "Artifact saved: {} ({} bytes, format: {})",
            output.display(),
            file_size,
            format
        );
        Ok(())
    }

    fn abort(&mut self) {
        self.stream = None;
        self.samples.lock().unwrap().clear();
        tracing::debug!("Capture aborted, samples discarded");
    }
}

/// Mixes incoming interleaved audio down to mono by averaging channels.
fn mix_to_mono(data: &[i16], samples_arc: &Arc<Mutex<Vec<i16>>>, num_channels: usize) {
    let mut samples = samples_arc.lock().unwrap();

    match num_channels {
        1 => samples.extend_from_slice(data),
        2 => {
            for chunk in data.chunks_exact(2) {
                let left = chunk[0] as i32;
                let right = chunk[1] as i32;
                samples.push(((left + right) / 2) as i16);
            }
        }
        _ => {
            for chunk in data.chunks_exact(num_channels) {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                samples.push((sum / num_channels as i32) as i16);
            }
        }
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
pub fn find_input_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    // Numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        let device_count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                device_count.saturating_sub(1)
            )
        });
    }

    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'speakai list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms ALSA doesn't exist, so no suppression is needed.
#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_mix_averages_pairs() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        mix_to_mono(&[100, 200, -50, -150], &samples, 2);
        assert_eq!(*samples.lock().unwrap(), vec![150, -100]);
    }

    #[test]
    fn multichannel_mix_averages_all_channels() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        mix_to_mono(&[30, 60, 90], &samples, 3);
        assert_eq!(*samples.lock().unwrap(), vec![60]);
    }

    #[test]
    fn mono_passes_through() {
        let samples = Arc::new(Mutex::new(Vec::new()));
        mix_to_mono(&[1, 2, 3], &samples, 1);
        assert_eq!(*samples.lock().unwrap(), vec![1, 2, 3]);
    }
}
