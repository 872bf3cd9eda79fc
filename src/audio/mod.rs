//! Audio capture, playback, and read-aloud.
//!
//! The session state machine lives in [`session`]; concrete cpal/ffmpeg/TTS
//! resources live behind the driver traits in [`driver`].

pub mod driver;
pub mod encode;
pub mod player;
pub mod recorder;
pub mod session;
pub mod speech;

pub use driver::{AudioDriver, SystemAudioDriver};
pub use session::{AudioSession, Phase};
