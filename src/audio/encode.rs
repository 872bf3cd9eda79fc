//! Audio format conversion via ffmpeg.
//!
//! Recordings are captured as PCM and encoded to the upload format (AAC in
//! an m4a container by default) with ffmpeg; playable artifacts are decoded
//! back to PCM WAV the same way. Provides cross-platform ffmpeg binary
//! discovery, checking standard installation locations before falling back
//! to PATH search.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locates the ffmpeg binary on the system.
///
/// Checks common per-platform installation locations first, then falls back
/// to PATH search via `which`/`where`.
///
/// # Returns
/// The path to the ffmpeg binary, or an error if not found.
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/opt/homebrew/bin/ffmpeg"), // Apple Silicon Homebrew
            PathBuf::from("/usr/local/bin/ffmpeg"),    // Intel Homebrew or manual install
            PathBuf::from("/usr/bin/ffmpeg"),          // Direct system install
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            PathBuf::from("/usr/bin/ffmpeg"),       // Standard Linux
            PathBuf::from("/usr/local/bin/ffmpeg"), // Manual install
            PathBuf::from("/snap/bin/ffmpeg"),      // Snap installation
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files (x86)\\ffmpeg\\bin\\ffmpeg.exe"),
        ]
    } else {
        vec![] // For other platforms, rely on PATH search
    };

    for path in candidates {
        if path.exists() {
            tracing::debug!("Found ffmpeg at: {}", path.display());
            return Ok(path);
        }
    }

    let ffmpeg_path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", ffmpeg_path.display());
    Ok(ffmpeg_path)
}

/// Searches for a binary in the system PATH.
///
/// Uses `which` on Unix systems and `where` on Windows.
fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(path_str.trim());
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "ffmpeg not found. Please install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}

/// Encodes a PCM WAV file into the upload format.
///
/// # Arguments
/// * `input_wav` - Path to the temporary WAV file
/// * `output_path` - Final artifact path
/// * `format` - Format string: "codec [options]", e.g. "aac -b:a 32k"
///
/// The format string is parsed to extract the codec and any additional
/// ffmpeg arguments. Mono conversion is always enforced.
pub fn encode_wav(input_wav: &Path, output_path: &Path, format: &str) -> Result<()> {
    let format_parts: Vec<&str> = format.split_whitespace().collect();

    if format_parts.is_empty() {
        return Err(anyhow!("Invalid format string: empty"));
    }

    let codec = format_parts[0];
    let ffmpeg_path = find_ffmpeg()?;

    let mut cmd = Command::new(&ffmpeg_path);
    cmd.arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input_wav)
        .arg("-acodec")
        .arg(codec)
        .arg("-ac")
        .arg("1") // Force mono
        .arg("-y"); // Overwrite output

    for option in &format_parts[1..] {
        cmd.arg(option);
    }

    cmd.arg(output_path);

    let output = cmd.output()?;

    if output.status.success() {
        tracing::debug!("Audio encoded to {} format", codec);
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&output.stderr);
        tracing::error!("ffmpeg encoding failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}

/// Decodes an artifact back into a mono PCM WAV at the given sample rate,
/// so it can be streamed to the output device for review playback.
pub fn decode_to_wav(input: &Path, output_wav: &Path, sample_rate: u32) -> Result<()> {
    let ffmpeg_path = find_ffmpeg()?;

    let output = Command::new(&ffmpeg_path)
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-ar")
        .arg(sample_rate.to_string())
        .arg("-ac")
        .arg("1")
        .arg("-y")
        .arg(output_wav)
        .output()?;

    if output.status.success() {
        tracing::debug!("Artifact decoded for playback: {}", output_wav.display());
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&output.stderr);
        tracing::error!("ffmpeg decoding failed: {}", error_msg);
        Err(anyhow!("Audio decoding failed: {error_msg}"))
    }
}

/// Maps a format string's codec to the artifact file extension.
pub fn extension_for_format(format: &str) -> &'static str {
    let codec = format.split_whitespace().next().unwrap_or("aac");
    match codec {
        "aac" => "m4a",
        "libopus" | "libvorbis" => "ogg",
        "flac" => "flac",
        "pcm_s16le" => "wav",
        "mp3" | "libmp3lame" => "mp3",
        _ => "m4a",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ffmpeg() {
        // This test will succeed if ffmpeg is installed
        match find_ffmpeg() {
            Ok(path) => println!("Found ffmpeg at: {}", path.display()),
            Err(e) => println!("ffmpeg not found (expected on CI): {e}"),
        }
    }

    #[test]
    fn extension_follows_codec() {
        assert_eq!(extension_for_format("aac -b:a 32k"), "m4a");
        assert_eq!(extension_for_format("libopus"), "ogg");
        assert_eq!(extension_for_format("pcm_s16le"), "wav");
        assert_eq!(extension_for_format(""), "m4a");
    }
}
