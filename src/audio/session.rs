//! Recording/playback lifecycle management.
//!
//! An [`AudioSession`] manages exactly one active audio "take" at a time
//! across recording, review playback, and read-aloud speech synthesis.
//! Platform audio resources are finite and leak across sessions if not
//! released, so the live resource is held in a single-slot arena tagged by
//! kind with one release entry point, and every transition fully releases
//! the previous resource before acquiring the next.
//!
//! State machine: `Idle → Recording → Stopped → {Playing ⇄ Paused}` and
//! back to `Idle` on reset. Read-aloud runs alongside the artifact states
//! but never concurrently with capture or playback.

use crate::audio::driver::{AudioDriver, CaptureHandle, PlaybackHandle, SpeechHandle};
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle phase of the current take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No take in progress and no artifact loaded
    Idle,
    /// Microphone capture in progress
    Recording,
    /// A finished artifact exists, playback not started
    Stopped,
    /// The artifact is playing
    Playing,
    /// Playback paused (or finished, pending rewind on next play)
    Paused,
}

/// The single-slot arena: at most one live audio resource at any instant.
enum ActiveAudio {
    None,
    Recorder(Box<dyn CaptureHandle>),
    Player(Box<dyn PlaybackHandle>),
    Speech(Box<dyn SpeechHandle>),
}

/// Cancellable 1 Hz duration counter for an in-progress recording.
///
/// The counting task is aborted on cancel and on drop, so no timer can
/// outlive the recording that started it.
struct DurationTicker {
    seconds: Arc<AtomicU64>,
    handle: tokio::task::JoinHandle<()>,
}

impl DurationTicker {
    fn start() -> Self {
        let seconds = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&seconds);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                counter.fetch_add(1, Ordering::Relaxed);
            }
        });
        Self { seconds, handle }
    }

    fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::Relaxed)
    }
}

impl Drop for DurationTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Owns the lifecycle of a single recording take and its playable artifact.
pub struct AudioSession {
    driver: Box<dyn AudioDriver>,
    /// Format string handed to the encoder ("codec [ffmpeg options]")
    format: String,
    /// Extension for artifact files, derived from the format codec
    extension: &'static str,
    phase: Phase,
    active: ActiveAudio,
    artifact: Option<PathBuf>,
    ticker: Option<DurationTicker>,
    /// Duration of the last finished take, frozen when the ticker is cancelled
    recorded_seconds: u64,
    take_seq: u32,
}

impl AudioSession {
    pub fn new(driver: Box<dyn AudioDriver>, format: &str) -> Self {
        Self {
            driver,
            format: format.to_string(),
            extension: crate::audio::encode::extension_for_format(format),
            phase: Phase::Idle,
            active: ActiveAudio::None,
            artifact: None,
            ticker: None,
            recorded_seconds: 0,
            take_seq: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Path of the finished artifact, if a take has been recorded.
    pub fn artifact(&self) -> Option<&PathBuf> {
        self.artifact.as_ref()
    }

    /// Whether read-aloud synthesis is currently running.
    pub fn is_reading(&self) -> bool {
        matches!(self.active, ActiveAudio::Speech(_))
    }

    /// Seconds recorded: live while recording, frozen after stop.
    pub fn elapsed_seconds(&self) -> u64 {
        match &self.ticker {
            Some(ticker) => ticker.seconds(),
            None => self.recorded_seconds,
        }
    }

    /// Releases whatever resource is live. The single entry point invoked on
    /// every transition; safe to call when nothing is active.
    fn release_active(&mut self) {
        match std::mem::replace(&mut self.active, ActiveAudio::None) {
            ActiveAudio::None => {}
            ActiveAudio::Recorder(mut recorder) => recorder.abort(),
            ActiveAudio::Player(mut player) => player.stop(),
            ActiveAudio::Speech(mut speech) => speech.stop(),
        }
    }

    /// Cancels the duration ticker, freezing the recorded duration.
    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            self.recorded_seconds = ticker.seconds();
        }
    }

    /// Reaps resources that completed on their own: finished read-aloud is
    /// released, and playback that reached end-of-track drops to `Paused`
    /// (position stays at the end; the next play rewinds).
    pub fn refresh(&mut self) {
        if let ActiveAudio::Speech(speech) = &mut self.active {
            if speech.finished() {
                self.release_active();
            }
        }
        if self.phase == Phase::Playing {
            if let ActiveAudio::Player(player) = &self.active {
                if player.finished() {
                    self.phase = Phase::Paused;
                }
            }
        }
    }

    /// Starts a new take.
    ///
    /// Any loaded artifact handle or running read-aloud is fully released
    /// first; a prior artifact is superseded. On failure the session stays
    /// in `Idle` with no partial state.
    ///
    /// # Errors
    /// - If a recording is already in progress
    /// - If the capture device cannot be opened
    pub fn start_recording(&mut self) -> Result<()> {
        if self.phase == Phase::Recording {
            return Err(anyhow!("A recording is already in progress"));
        }

        // Sequential hand-off: the previous resource is released before the
        // recorder is acquired.
        self.release_active();
        self.cancel_ticker();
        self.discard_artifact();
        self.recorded_seconds = 0;

        let recorder = match self.driver.open_recorder() {
            Ok(recorder) => recorder,
            Err(e) => {
                tracing::error!("Failed to start recording: {}", e);
                self.phase = Phase::Idle;
                return Err(e);
            }
        };

        self.active = ActiveAudio::Recorder(recorder);
        self.phase = Phase::Recording;
        self.ticker = Some(DurationTicker::start());
        tracing::info!("Recording started");
        Ok(())
    }

    /// Finishes the current take, producing the artifact and loading it into
    /// a paused, position-zero playable handle.
    ///
    /// Calling this when no recording is active is a safe no-op.
    ///
    /// # Errors
    /// - If encoding the take fails (the session returns to `Idle`)
    pub fn stop_recording(&mut self) -> Result<Option<PathBuf>> {
        if self.phase != Phase::Recording {
            return Ok(None);
        }

        self.cancel_ticker();

        let ActiveAudio::Recorder(mut recorder) =
            std::mem::replace(&mut self.active, ActiveAudio::None)
        else {
            // Phase said Recording but the arena disagrees; recover to Idle.
            self.phase = Phase::Idle;
            return Ok(None);
        };

        self.take_seq += 1;
        let path = std::env::temp_dir().join(format!(
            "speakai-take-{}-{}.{}",
            std::process::id(),
            self.take_seq,
            self.extension
        ));

        if let Err(e) = recorder.finish(&path, &self.format) {
            tracing::error!("Failed to finish recording: {}", e);
            self.phase = Phase::Idle;
            return Err(e);
        }

        self.artifact = Some(path.clone());

        // Load the artifact paused at position zero for review playback.
        // Playback being unavailable doesn't invalidate the artifact.
        match self.driver.open_player(&path) {
            Ok(player) => self.active = ActiveAudio::Player(player),
            Err(e) => tracing::warn!("Failed to load artifact for playback: {}", e),
        }

        self.phase = Phase::Stopped;
        tracing::info!("Recording stopped: {}", path.display());
        Ok(Some(path))
    }

    /// Toggles review playback of the finished artifact.
    ///
    /// Playback that previously reached end-of-track is rewound to zero
    /// before playing again (explicit rewind-if-finished, no auto-loop).
    ///
    /// # Errors
    /// - If a recording is in progress or no artifact exists
    /// - If the playback stream fails
    pub fn toggle_playback(&mut self) -> Result<()> {
        self.refresh();

        if self.phase == Phase::Recording {
            return Err(anyhow!("Stop the recording before playback"));
        }
        let artifact = self
            .artifact
            .clone()
            .ok_or_else(|| anyhow!("No recording to play"))?;

        if self.phase == Phase::Playing {
            if let ActiveAudio::Player(player) = &mut self.active {
                player.pause()?;
            }
            self.phase = Phase::Paused;
            return Ok(());
        }

        // Read-aloud may have displaced the player from the arena; reload
        // the artifact in that case.
        if !matches!(self.active, ActiveAudio::Player(_)) {
            self.release_active();
            let player = self.driver.open_player(&artifact)?;
            self.active = ActiveAudio::Player(player);
        }

        if let ActiveAudio::Player(player) = &mut self.active {
            if player.finished() {
                player.rewind();
            }
            player.play()?;
        }
        self.phase = Phase::Playing;
        Ok(())
    }

    /// Toggles read-aloud of the given text. Returns whether synthesis is
    /// now running.
    ///
    /// Starting read-aloud fully stops any active capture (discarding the
    /// unfinished take) or playback first; a finished artifact survives and
    /// can be played again afterwards.
    ///
    /// # Errors
    /// - If the speech engine cannot be started
    pub fn toggle_read_aloud(&mut self, text: &str) -> Result<bool> {
        self.refresh();

        if self.is_reading() {
            self.release_active();
            return Ok(false);
        }

        if self.phase == Phase::Recording {
            // An unfinished take has no artifact; discard it.
            self.release_active();
            self.cancel_ticker();
            self.recorded_seconds = 0;
            self.phase = Phase::Idle;
        } else {
            self.release_active();
            if self.phase == Phase::Playing {
                self.phase = Phase::Paused;
            }
        }

        let speech = self.driver.open_speech(text)?;
        self.active = ActiveAudio::Speech(speech);
        Ok(true)
    }

    /// Discards the artifact and returns to `Idle`. Always safe to call.
    pub fn reset(&mut self) {
        self.release_active();
        self.cancel_ticker();
        self.discard_artifact();
        self.recorded_seconds = 0;
        self.phase = Phase::Idle;
    }

    fn discard_artifact(&mut self) {
        if let Some(path) = self.artifact.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::debug!("Failed to remove artifact {}: {}", path.display(), e);
            }
        }
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        // Guaranteed teardown: recorder, playable handle, speech process,
        // and ticker are all released when the session goes away.
        self.release_active();
        self.cancel_ticker();
        self.discard_artifact();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    /// Records every driver interaction so tests can assert ordering and
    /// exactly-once release.
    #[derive(Default)]
    struct DriverLog {
        events: Vec<String>,
        playback_finished: bool,
        speech_finished: bool,
        fail_recorder: bool,
    }

    type SharedLog = Rc<RefCell<DriverLog>>;

    struct FakeDriver {
        log: SharedLog,
    }

    struct FakeCapture {
        log: SharedLog,
        released: bool,
    }

    impl CaptureHandle for FakeCapture {
        fn finish(&mut self, output: &Path, _format: &str) -> Result<()> {
            assert!(!self.released, "capture released twice");
            self.released = true;
            std::fs::write(output, b"fake-take").unwrap();
            self.log.borrow_mut().events.push("capture.finish".into());
            Ok(())
        }

        fn abort(&mut self) {
            assert!(!self.released, "capture released twice");
            self.released = true;
            self.log.borrow_mut().events.push("capture.abort".into());
        }
    }

    struct FakePlayer {
        log: SharedLog,
        released: bool,
    }

    impl PlaybackHandle for FakePlayer {
        fn play(&mut self) -> Result<()> {
            self.log.borrow_mut().events.push("player.play".into());
            Ok(())
        }

        fn pause(&mut self) -> Result<()> {
            self.log.borrow_mut().events.push("player.pause".into());
            Ok(())
        }

        fn finished(&self) -> bool {
            self.log.borrow().playback_finished
        }

        fn rewind(&mut self) {
            self.log.borrow_mut().playback_finished = false;
            self.log.borrow_mut().events.push("player.rewind".into());
        }

        fn stop(&mut self) {
            assert!(!self.released, "player released twice");
            self.released = true;
            self.log.borrow_mut().events.push("player.stop".into());
        }
    }

    struct FakeSpeech {
        log: SharedLog,
        released: bool,
    }

    impl SpeechHandle for FakeSpeech {
        fn finished(&mut self) -> bool {
            self.log.borrow().speech_finished
        }

        fn stop(&mut self) {
            assert!(!self.released, "speech released twice");
            self.released = true;
            self.log.borrow_mut().events.push("speech.stop".into());
        }
    }

    impl AudioDriver for FakeDriver {
        fn open_recorder(&self) -> Result<Box<dyn CaptureHandle>> {
            if self.log.borrow().fail_recorder {
                return Err(anyhow!("microphone permission denied"));
            }
            self.log.borrow_mut().events.push("capture.open".into());
            Ok(Box::new(FakeCapture {
                log: Rc::clone(&self.log),
                released: false,
            }))
        }

        fn open_player(&self, artifact: &Path) -> Result<Box<dyn PlaybackHandle>> {
            assert!(artifact.exists(), "player opened on missing artifact");
            self.log.borrow_mut().events.push("player.open".into());
            Ok(Box::new(FakePlayer {
                log: Rc::clone(&self.log),
                released: false,
            }))
        }

        fn open_speech(&self, _text: &str) -> Result<Box<dyn SpeechHandle>> {
            self.log.borrow_mut().events.push("speech.open".into());
            Ok(Box::new(FakeSpeech {
                log: Rc::clone(&self.log),
                released: false,
            }))
        }
    }

    fn session() -> (AudioSession, SharedLog) {
        let log = SharedLog::default();
        let driver = FakeDriver {
            log: Rc::clone(&log),
        };
        (AudioSession::new(Box::new(driver), "aac -b:a 32k"), log)
    }

    fn count(log: &SharedLog, event: &str) -> usize {
        log.borrow().events.iter().filter(|e| *e == event).count()
    }

    #[tokio::test]
    async fn stop_without_start_is_a_safe_noop() {
        let (mut session, log) = session();
        assert!(session.stop_recording().unwrap().is_none());
        assert_eq!(session.phase(), Phase::Idle);
        assert!(log.borrow().events.is_empty());
    }

    #[tokio::test]
    async fn record_stop_produces_paused_artifact() {
        let (mut session, log) = session();

        session.start_recording().unwrap();
        assert_eq!(session.phase(), Phase::Recording);

        let artifact = session.stop_recording().unwrap().unwrap();
        assert_eq!(session.phase(), Phase::Stopped);
        assert_eq!(session.artifact(), Some(&artifact));
        assert_eq!(
            log.borrow().events,
            vec!["capture.open", "capture.finish", "player.open"]
        );

        session.reset();
        std::fs::remove_file(&artifact).ok();
    }

    #[tokio::test]
    async fn starting_a_recording_stops_read_aloud_first() {
        let (mut session, log) = session();

        assert!(session.toggle_read_aloud("Some article text").unwrap());
        assert!(session.is_reading());

        session.start_recording().unwrap();
        assert!(!session.is_reading());
        assert_eq!(session.phase(), Phase::Recording);
        // The speech process is fully stopped before the recorder opens
        assert_eq!(
            log.borrow().events,
            vec!["speech.open", "speech.stop", "capture.open"]
        );
    }

    #[tokio::test]
    async fn read_aloud_during_recording_discards_the_take() {
        let (mut session, log) = session();

        session.start_recording().unwrap();
        assert!(session.toggle_read_aloud("text").unwrap());

        assert!(session.is_reading());
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.artifact().is_none());
        assert_eq!(count(&log, "capture.abort"), 1);
    }

    #[tokio::test]
    async fn playback_toggles_and_rewinds_after_finish() {
        let (mut session, log) = session();

        session.start_recording().unwrap();
        session.stop_recording().unwrap();

        session.toggle_playback().unwrap();
        assert_eq!(session.phase(), Phase::Playing);
        session.toggle_playback().unwrap();
        assert_eq!(session.phase(), Phase::Paused);

        // End of track: refresh drops to Paused, next play rewinds first
        session.toggle_playback().unwrap();
        log.borrow_mut().playback_finished = true;
        session.refresh();
        assert_eq!(session.phase(), Phase::Paused);

        session.toggle_playback().unwrap();
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(count(&log, "player.rewind"), 1);

        session.reset();
    }

    #[tokio::test]
    async fn read_aloud_displaces_player_but_keeps_artifact() {
        let (mut session, log) = session();

        session.start_recording().unwrap();
        let artifact = session.stop_recording().unwrap().unwrap();

        assert!(session.toggle_read_aloud("text").unwrap());
        assert_eq!(count(&log, "player.stop"), 1);
        assert_eq!(session.artifact(), Some(&artifact));

        // Playing again reloads the artifact
        session.toggle_playback().unwrap();
        assert_eq!(session.phase(), Phase::Playing);
        assert_eq!(count(&log, "speech.stop"), 1);
        assert_eq!(count(&log, "player.open"), 2);

        session.reset();
    }

    #[tokio::test]
    async fn playback_during_recording_is_rejected() {
        let (mut session, _log) = session();
        session.start_recording().unwrap();
        assert!(session.toggle_playback().is_err());
        assert_eq!(session.phase(), Phase::Recording);
    }

    #[tokio::test]
    async fn reset_releases_every_resource_exactly_once() {
        let (mut session, log) = session();

        session.start_recording().unwrap();
        session.stop_recording().unwrap();
        session.toggle_playback().unwrap();

        session.reset();

        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.artifact().is_none());
        assert_eq!(count(&log, "player.stop"), 1);
        // The fakes themselves panic on double release
    }

    #[tokio::test]
    async fn drop_releases_active_resources() {
        let (mut session, log) = session();
        session.start_recording().unwrap();
        drop(session);
        assert_eq!(count(&log, "capture.abort"), 1);
    }

    #[tokio::test]
    async fn failed_recorder_leaves_session_idle() {
        let (mut session, log) = session();
        log.borrow_mut().fail_recorder = true;

        assert!(session.start_recording().is_err());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.elapsed_seconds(), 0);
        assert!(session.stop_recording().unwrap().is_none());
    }

    #[tokio::test]
    async fn finished_read_aloud_is_reaped_on_refresh() {
        let (mut session, log) = session();

        session.toggle_read_aloud("text").unwrap();
        log.borrow_mut().speech_finished = true;
        session.refresh();

        assert!(!session.is_reading());
        assert_eq!(count(&log, "speech.stop"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_ticker_counts_and_freezes_on_stop() {
        let (mut session, _log) = session();

        session.start_recording().unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(session.elapsed_seconds(), 3);

        session.stop_recording().unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        // Ticker cancelled: the duration no longer advances
        assert_eq!(session.elapsed_seconds(), 3);

        session.reset();
    }
}
