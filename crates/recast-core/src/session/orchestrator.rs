use crate::{
    CaptureError, SessionError, SessionResult,
    capture::{AudioProvider, AudioSource, ImageProvider, SourceKind, SourceSelection, VideoSource},
    error::BuildStage,
    overlay::{ElapsedClock, OverlayDeps, OverlayedImageProvider, build_overlays},
    recorder::{
        AudioJob, AudioRecorder, FrameJob, FrameRecorder, Recorder, VfrJob, VfrRecorder,
        fault_channel,
    },
    session::{
        MessageSurface, PendingStops, PowerEvent, RecentItemType, RecentList, RecentStatus,
        RecorderState, RegionLock, SessionEvent, SessionPlan, SessionSettings, Shell, Stopwatch,
    },
    writer::{
        AudioTarget, EncoderProbe, PreviewSurface, PreviewWriter, VideoFileWriter,
        VideoWriterArgs, WriterKind,
    },
};

use std::{
    collections::HashMap,
    panic::Location,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use chrono::Local;
use error_location::ErrorLocation;
use image::ImageFormat;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Period of the duration/elapsed timer.
pub const TICK: Duration = Duration::from_millis(500);

const VFR_TIMEOUT: Duration = Duration::from_millis(5000);
const NO_AUDIO_PROMPT: &str = "Audio won't be included in the recording.\nDo you want to record?";

/// Host capabilities the orchestrator is built with.
#[derive(Clone)]
pub struct OrchestratorDeps {
    /// Dialogs and notifications.
    pub messages: Arc<dyn MessageSurface>,
    /// Window, clipboard and launcher.
    pub shell: Arc<dyn Shell>,
    /// Region selector lock.
    pub region: Arc<dyn RegionLock>,
    /// Live preview.
    pub preview: Arc<dyn PreviewSurface>,
    /// External encoder detection.
    pub encoders: Arc<dyn EncoderProbe>,
    /// The user's selected audio devices.
    pub audio: Arc<dyn AudioSource>,
    /// Overlay capabilities.
    pub overlays: OverlayDeps,
}

struct ActiveSession {
    id: Uuid,
    generation: u64,
    recorder: Box<dyn Recorder>,
    output_path: PathBuf,
    saves_file: bool,
    is_video: bool,
    locks_region: bool,
    minimized: bool,
    copy_path: bool,
    start_delay: Duration,
    duration: Option<Duration>,
    waiting: bool,
    stop_requested: bool,
    ticker: Option<JoinHandle<()>>,
    delay_task: Option<JoinHandle<()>>,
    fault_watch: JoinHandle<()>,
}

struct SavePlan {
    path: PathBuf,
    is_video: bool,
    recent_id: Option<u64>,
    copy_path: bool,
    post_save: bool,
}

enum Inputs {
    Video {
        images: Box<dyn ImageProvider>,
        writer: Arc<dyn WriterKind>,
        vfr: bool,
    },
    Audio {
        target: Arc<dyn AudioTarget>,
    },
}

/// Owns the recording state machine.
///
/// Lives on one loop: every method takes `&mut self`, and background work
/// (timers, fault watchers, disposals) only posts [`SessionEvent`]s that the
/// loop feeds back through [`Orchestrator::handle_event`]. Must be used from
/// within a tokio runtime.
pub struct Orchestrator {
    deps: OrchestratorDeps,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: RecorderState,
    session: Option<ActiveSession>,
    generation: u64,
    stopwatch: Stopwatch,
    clock: ElapsedClock,
    pending: PendingStops,
    recent: RecentList,
    finishing: HashMap<u64, SavePlan>,
    source_fallback: Option<SourceKind>,
}

impl Orchestrator {
    /// Create an idle orchestrator and the receiver its events arrive on.
    pub fn new(deps: OrchestratorDeps) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            deps,
            events,
            state: RecorderState::NotRecording,
            session: None,
            generation: 0,
            stopwatch: Stopwatch::default(),
            clock: ElapsedClock::default(),
            pending: PendingStops::new(),
            recent: RecentList::default(),
            finishing: HashMap::new(),
            source_fallback: None,
        };
        (orchestrator, rx)
    }

    /// Current state.
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// True while the session waits out its start delay.
    pub fn is_waiting(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.waiting)
    }

    /// Elapsed recording time, truncated to whole seconds.
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs(self.stopwatch.elapsed().as_secs())
    }

    /// Output of the active session.
    pub fn output_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.output_path.as_path())
    }

    /// Whether the active session records video.
    pub fn is_video(&self) -> Option<bool> {
        self.session.as_ref().map(|s| s.is_video)
    }

    /// Id of the active session.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Outputs of past sessions.
    pub fn recent(&self) -> &RecentList {
        &self.recent
    }

    /// In-flight disposals.
    pub fn pending_stops(&self) -> &PendingStops {
        &self.pending
    }

    /// Clock the elapsed overlay reads.
    pub fn elapsed_clock(&self) -> &ElapsedClock {
        &self.clock
    }

    /// Source kind the user agreed to switch to after an unsupported backend
    /// was reported. The host persists it.
    pub fn take_source_fallback(&mut self) -> Option<SourceKind> {
        self.source_fallback.take()
    }

    /// Begin a session when idle, end the active one otherwise.
    pub fn toggle_recording(&mut self, plan: impl FnOnce() -> SessionPlan) -> SessionResult<()> {
        if self.state == RecorderState::NotRecording {
            self.begin_session(plan())
        } else {
            self.end_session();
            Ok(())
        }
    }

    /// Build the capture pipeline and start recording.
    ///
    /// Errors are also reported through the message surface unless they
    /// already had their own prompt. On error nothing stays allocated and the
    /// state is `NotRecording`.
    #[instrument(skip(self, plan), fields(kind = %plan.selection.kind()))]
    pub fn begin_session(&mut self, plan: SessionPlan) -> SessionResult<()> {
        let result = self.try_begin(plan);
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    #[track_caller]
    fn try_begin(&mut self, plan: SessionPlan) -> SessionResult<()> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let SessionPlan {
            settings,
            selection,
            file_name,
        } = plan;
        let kind = selection.kind();
        let is_video = selection.is_video();
        let extension = selection.extension().to_string();
        let frame_rate = settings.frame_rate();

        if let Some(encoder) = selection.required_encoder() {
            if !self.deps.encoders.is_available(encoder) {
                return Err(SessionError::EncoderUnavailable {
                    encoder,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        if settings.audio_enabled
            && !selection.carries_audio()
            && !self.deps.messages.show_yes_no(NO_AUDIO_PROMPT, "No Audio")
        {
            return Err(SessionError::UserDeclined {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let inputs = match selection {
            SourceSelection::Video { source, writer } => {
                let vfr = settings.variable_frame_rate && writer.capabilities().variable_frame_rate;
                let images = self.open_images(source.as_ref(), &settings, vfr)?;
                Inputs::Video {
                    images,
                    writer,
                    vfr,
                }
            }
            SourceSelection::AudioOnly { target } => Inputs::Audio { target },
        };

        let saves_file = !extension.is_empty();
        let output_path = match file_name {
            Some(path) => path,
            None => self.timestamped_path(&settings.output_dir, &extension),
        };
        if saves_file {
            prepare_output_dir(&output_path)?;
        }

        let (faults, mut fault_rx) = fault_channel();
        let recorder: Box<dyn Recorder> = match inputs {
            Inputs::Video {
                images,
                writer,
                vfr,
            } => {
                let audio = if settings.audio_enabled && writer.capabilities().carries_audio && !vfr
                {
                    Some(self.open_audio(frame_rate)?)
                } else {
                    None
                };

                self.deps.preview.init(images.width(), images.height());
                let args = VideoWriterArgs {
                    path: output_path.clone(),
                    frame_rate,
                    video_quality: settings.video_quality,
                    audio_quality: settings.audio_quality,
                    width: images.width(),
                    height: images.height(),
                    audio_format: audio.as_ref().map(|a| a.wave_format()),
                };
                let inner = writer.create(args).map_err(|source| {
                    SessionError::PipelineBuildFailure {
                        stage: BuildStage::Writer,
                        source,
                        location: ErrorLocation::from(Location::caller()),
                    }
                })?;
                let file_writer: Box<dyn VideoFileWriter> =
                    Box::new(PreviewWriter::new(inner, Arc::clone(&self.deps.preview)));

                if vfr && file_writer.capabilities().variable_frame_rate {
                    debug!("Using variable frame rate recorder");
                    Box::new(VfrRecorder::new(
                        VfrJob::new(images, file_writer, frame_rate),
                        faults,
                    ))
                } else {
                    Box::new(FrameRecorder::new(
                        FrameJob::new(images, file_writer, audio, frame_rate),
                        faults,
                    ))
                }
            }
            Inputs::Audio { target } => {
                if !settings.audio_enabled {
                    return Err(SessionError::PipelineBuildFailure {
                        stage: BuildStage::AudioProvider,
                        source: CaptureError::device("No audio source is enabled"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                let audio = self.open_audio(frame_rate)?;
                let writer = target
                    .create(&output_path, audio.wave_format(), settings.audio_quality)
                    .map_err(|source| SessionError::PipelineBuildFailure {
                        stage: BuildStage::Writer,
                        source,
                        location: ErrorLocation::from(Location::caller()),
                    })?;
                Box::new(AudioRecorder::new(AudioJob::new(audio, writer), faults))
            }
        };

        let locks_region = kind.locks_region();
        if locks_region {
            self.deps.region.lock();
        }
        self.deps.messages.hide_notification();
        if settings.minimize_on_start {
            self.deps.shell.set_minimized(true);
        }

        self.generation += 1;
        let generation = self.generation;
        let id = Uuid::new_v4();
        self.stopwatch.reset();
        self.stopwatch.start();
        self.clock.set(0);

        let events = self.events.clone();
        let fault_watch = tokio::spawn(async move {
            if let Some(error) = fault_rx.recv().await {
                post(&events, SessionEvent::Fault { generation, error });
            }
        });

        let start_delay = settings.start_delay();
        let waiting = !start_delay.is_zero();
        let delay_task = waiting.then(|| spawn_delay(self.events.clone(), generation, start_delay));

        info!(
            session_id = %id,
            generation,
            path = %output_path.display(),
            start_delay_ms = start_delay.as_millis() as u64,
            duration_ms = settings.duration_ms,
            "Recording session started"
        );

        self.session = Some(ActiveSession {
            id,
            generation,
            recorder,
            output_path,
            saves_file,
            is_video,
            locks_region,
            minimized: settings.minimize_on_start,
            copy_path: settings.copy_path_to_clipboard,
            start_delay,
            duration: settings.duration(),
            waiting,
            stop_requested: false,
            ticker: Some(spawn_ticker(self.events.clone(), generation)),
            delay_task,
            fault_watch,
        });
        self.state = RecorderState::Recording;

        if !waiting {
            self.start_recorder()?;
        }
        Ok(())
    }

    /// A timestamped path in `dir` that no file and no unfinished save uses.
    fn timestamped_path(&self, dir: &Path, extension: &str) -> PathBuf {
        let stem = Local::now().format("%Y-%m-%d-%H-%M-%S").to_string();
        unique_output_path(dir, &stem, extension, |path| {
            path.exists()
                || self.finishing.values().any(|plan| plan.path == path)
                || self.output_path() == Some(path)
        })
    }

    #[track_caller]
    fn open_images(
        &mut self,
        source: &dyn VideoSource,
        settings: &SessionSettings,
        vfr: bool,
    ) -> SessionResult<Box<dyn ImageProvider>> {
        let kind = source.kind();
        let opened = match source.open(settings.include_cursor) {
            Ok(Some(opened)) => opened,
            Ok(None) => {
                info!(source = source.name(), "Source picker dismissed");
                return Err(SessionError::UserDeclined {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            Err(CaptureError::NotSupported { reason, .. }) if kind.fallback().is_some() => {
                return Err(self.offer_fallback(kind, reason));
            }
            Err(e) => {
                return Err(SessionError::PipelineBuildFailure {
                    stage: BuildStage::ImageProvider,
                    source: e,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let overlays = build_overlays(&settings.overlays, &self.deps.overlays, &self.clock);
        let mut provider = OverlayedImageProvider::new(opened.provider, opened.transform, overlays);
        if vfr && !provider.set_timeout(VFR_TIMEOUT) {
            debug!(source = source.name(), "Provider has no frame timeout");
        }

        Ok(Box::new(provider))
    }

    #[track_caller]
    fn offer_fallback(&mut self, kind: SourceKind, reason: String) -> SessionError {
        let messages = &self.deps.messages;
        let switched_to = kind.fallback().filter(|fallback| {
            messages.show_yes_no(
                &format!(
                    "{kind} capture is not supported on this system.\n{reason}\n\nSwitch to {fallback} capture permanently?"
                ),
                "Not Supported",
            )
        });

        if let Some(fallback) = switched_to {
            info!(from = %kind, to = %fallback, "Switching video source kind");
            self.source_fallback = Some(fallback);
        }

        SessionError::UnsupportedCapability {
            reason,
            switched_to,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    fn open_audio(&self, frame_rate: u32) -> SessionResult<Box<dyn AudioProvider>> {
        self.deps
            .audio
            .audio_provider(frame_rate)
            .map_err(|source| SessionError::PipelineBuildFailure {
                stage: BuildStage::AudioProvider,
                source,
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    fn start_recorder(&mut self) -> SessionResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        match session.recorder.start() {
            Ok(()) => Ok(()),
            Err(source) => {
                self.abort_session();
                Err(SessionError::RuntimeCaptureFailure {
                    source,
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Capture one frame of the plan's video source.
    ///
    /// The frame goes to the clipboard when `screenshot_to_clipboard` is set
    /// and is saved as PNG otherwise. Runs alongside any active session.
    /// Returns the saved file; `None` for clipboard captures. Errors are also
    /// reported through the message surface unless they are silent.
    #[instrument(skip(self, plan), fields(kind = %plan.selection.kind()))]
    pub fn take_screenshot(&mut self, plan: SessionPlan) -> SessionResult<Option<PathBuf>> {
        let result = self.try_screenshot(plan);
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    #[track_caller]
    fn try_screenshot(&mut self, plan: SessionPlan) -> SessionResult<Option<PathBuf>> {
        let SessionPlan {
            settings,
            selection,
            file_name,
        } = plan;
        let SourceSelection::Video { source, .. } = selection else {
            return Err(SessionError::ScreenshotFailure {
                source: CaptureError::not_supported("No video source is selected"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let mut images = self.open_images(source.as_ref(), &settings, false)?;
        let frame = images
            .capture()
            .map_err(|source| SessionError::ScreenshotFailure {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;
        drop(images);

        if settings.screenshot_to_clipboard {
            self.deps.shell.copy_image(&frame);
            info!(
                width = frame.width(),
                height = frame.height(),
                "Screenshot copied to clipboard"
            );
            return Ok(None);
        }

        let path = match file_name {
            Some(path) => path,
            None => self.timestamped_path(&settings.output_dir, ".png"),
        };
        prepare_output_dir(&path)?;
        frame
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| SessionError::ScreenshotFailure {
                source: CaptureError::from(e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let id = self.recent.add(&path, RecentItemType::Image);
        self.recent.set_status(id, RecentStatus::Saved);
        info!(path = %path.display(), "Screenshot saved");

        if settings.copy_path_to_clipboard {
            self.deps.shell.copy_text(&path.display().to_string());
        }
        let shell = Arc::clone(&self.deps.shell);
        let launch = path.clone();
        self.deps.messages.notify(
            "Screenshot saved",
            Some(Box::new(move || shell.launch(&launch))),
        );

        Ok(Some(path))
    }

    /// Pause when recording, resume when paused.
    #[instrument(skip(self))]
    pub fn toggle_pause(&mut self) {
        let events = self.events.clone();
        let Some(session) = self.session.as_mut() else {
            debug!("No active session to pause");
            return;
        };

        match self.state {
            RecorderState::Recording => {
                if let Err(e) = session.recorder.pause() {
                    warn!(error = %e, "Failed to pause recorder");
                }
                if let Some(ticker) = session.ticker.take() {
                    ticker.abort();
                }
                self.stopwatch.pause();
                self.clock.set(self.stopwatch.elapsed().as_secs());
                self.state = RecorderState::Paused;
                self.deps.messages.notify("Paused", None);
                info!(elapsed_ms = self.stopwatch.elapsed().as_millis() as u64, "Recording paused");
            }
            RecorderState::Paused => {
                session.ticker = Some(spawn_ticker(events, session.generation));
                let waiting = session.waiting;
                self.deps.messages.hide_notification();
                self.stopwatch.start();
                self.state = RecorderState::Recording;
                info!(waiting, "Recording resumed");

                if !waiting {
                    if let Err(e) = self.start_recorder() {
                        self.report(&e);
                    }
                }
            }
            RecorderState::NotRecording => {}
        }
    }

    /// Stop the active session without blocking.
    ///
    /// The recorder is disposed on the blocking pool; post-save actions run
    /// when its [`SessionEvent::StopFinished`] comes back. No-op when idle.
    #[instrument(skip(self))]
    pub fn end_session(&mut self) {
        match self.session.take() {
            Some(session) => self.finish_session(session, true),
            None => debug!("No active session to end"),
        }
    }

    fn abort_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.finish_session(session, false);
        }
    }

    fn finish_session(&mut self, session: ActiveSession, post_save: bool) {
        let ActiveSession {
            id,
            generation,
            recorder,
            output_path,
            saves_file,
            is_video,
            locks_region,
            minimized,
            copy_path,
            ticker,
            delay_task,
            fault_watch,
            ..
        } = session;

        self.state = RecorderState::NotRecording;
        for task in [ticker, delay_task].into_iter().flatten() {
            task.abort();
        }
        fault_watch.abort();
        self.stopwatch.pause();
        self.clock.set(self.stopwatch.elapsed().as_secs());

        if minimized {
            self.deps.shell.set_minimized(false);
        }
        if locks_region {
            self.deps.region.release();
        }

        let post_save = post_save && saves_file;
        let recent_id = post_save.then(|| {
            let item_type = if is_video {
                RecentItemType::Video
            } else {
                RecentItemType::Audio
            };
            self.recent.add(&output_path, item_type)
        });

        let handle = self.pending.track(id, recorder);
        self.finishing.insert(
            generation,
            SavePlan {
                path: output_path,
                is_video,
                recent_id,
                copy_path,
                post_save,
            },
        );

        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(CaptureError::device(format!("Disposal task failed: {e}"))),
            };
            post(
                &events,
                SessionEvent::StopFinished {
                    generation,
                    outcome,
                },
            );
        });

        info!(
            session_id = %id,
            generation,
            pending_stops = self.pending.count(),
            "Recording session ended"
        );
    }

    /// React to an OS power notification.
    pub fn on_power_event(&mut self, event: PowerEvent) {
        if event == PowerEvent::Suspend && self.state == RecorderState::Recording {
            info!("System suspending, pausing recording");
            self.toggle_pause();
        }
    }

    /// Apply an event posted by a background task.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Tick { generation } => self.on_tick(generation),
            SessionEvent::DelayElapsed { generation } => self.on_delay_elapsed(generation),
            SessionEvent::Fault { generation, error } => self.on_fault(generation, error),
            SessionEvent::StopFinished {
                generation,
                outcome,
            } => self.on_stop_finished(generation, outcome),
        }
    }

    /// End the active session and wait until every recording is flushed.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self) {
        self.end_session();

        let pending = self.pending.count();
        if pending > 0 {
            info!(pending_stops = pending, "Waiting for recordings to finish saving");
        }
        self.pending.wait_all().await;
        info!("Orchestrator shut down");
    }

    fn active_mut(&mut self, generation: u64) -> Option<&mut ActiveSession> {
        self.session
            .as_mut()
            .filter(|s| s.generation == generation)
    }

    fn on_tick(&mut self, generation: u64) {
        if self.state != RecorderState::Recording {
            return;
        }
        let elapsed = self.stopwatch.elapsed();
        let Some(session) = self.active_mut(generation) else {
            return;
        };
        if session.stop_requested {
            return;
        }

        let limit = session.duration.map(|d| session.start_delay + d);
        let reached = limit.is_some_and(|limit| elapsed >= limit);
        if reached {
            session.stop_requested = true;
        }
        self.clock.set(elapsed.as_secs());

        if reached {
            info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Recording duration reached"
            );
            self.end_session();
        }
    }

    fn on_delay_elapsed(&mut self, generation: u64) {
        let paused = self.state == RecorderState::Paused;
        let Some(session) = self.active_mut(generation) else {
            debug!(generation, "Ignoring start delay of a finished session");
            return;
        };
        session.delay_task = None;
        if !session.waiting {
            return;
        }
        session.waiting = false;

        if paused {
            debug!("Start delay elapsed while paused");
            return;
        }
        if let Err(e) = self.start_recorder() {
            self.report(&e);
        }
    }

    fn on_fault(&mut self, generation: u64, error: CaptureError) {
        if self.active_mut(generation).is_none() {
            debug!(generation, error = %error, "Ignoring fault of a finished session");
            return;
        }

        self.abort_session();
        let failure = SessionError::RuntimeCaptureFailure {
            source: error,
            location: ErrorLocation::from(Location::caller()),
        };
        self.report(&failure);
    }

    fn on_stop_finished(&mut self, generation: u64, outcome: crate::CaptureResult<()>) {
        let Some(plan) = self.finishing.remove(&generation) else {
            return;
        };

        match outcome {
            Ok(()) => {
                if let Some(id) = plan.recent_id {
                    self.recent.set_status(id, RecentStatus::Saved);
                }
                info!(generation, path = %plan.path.display(), "Recording saved");

                if plan.post_save {
                    if plan.copy_path {
                        self.deps.shell.copy_text(&plan.path.display().to_string());
                    }
                    let shell = Arc::clone(&self.deps.shell);
                    let path = plan.path;
                    let text = if plan.is_video {
                        "Video saved"
                    } else {
                        "Audio saved"
                    };
                    self.deps
                        .messages
                        .notify(text, Some(Box::new(move || shell.launch(&path))));
                }
            }
            Err(source) => {
                let failure = SessionError::StopFailure {
                    source,
                    location: ErrorLocation::from(Location::caller()),
                };
                error!(generation, error = %failure, "Failed to finish recording");
                if let Some(id) = plan.recent_id {
                    self.recent.set_status(id, RecentStatus::Failed);
                }
                if plan.post_save {
                    self.deps.messages.show_error(&failure.user_message());
                }
            }
        }
    }

    fn report(&self, failure: &SessionError) {
        if failure.is_silent() {
            info!(error = %failure, "Session not started");
        } else {
            error!(error = %failure, "Session failed");
            self.deps.messages.show_error(&failure.user_message());
        }
    }
}

/// `<dir>/<stem><extension>`, or `<dir>/<stem>-N<extension>` with the
/// smallest `N` for which `taken` is false.
pub(crate) fn unique_output_path(
    dir: &Path,
    stem: &str,
    extension: &str,
    taken: impl Fn(&Path) -> bool,
) -> PathBuf {
    let mut path = dir.join(format!("{stem}{extension}"));
    let mut suffix = 1u32;
    while taken(&path) {
        path = dir.join(format!("{stem}-{suffix}{extension}"));
        suffix += 1;
    }
    path
}

#[track_caller]
fn prepare_output_dir(path: &Path) -> SessionResult<()> {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(dir).map_err(|e| SessionError::PipelineBuildFailure {
        stage: BuildStage::Output,
        source: CaptureError::from(e),
        location: ErrorLocation::from(Location::caller()),
    })
}

fn post(events: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if events.send(event).is_err() {
        debug!("Session event loop is gone");
    }
}

fn spawn_ticker(events: mpsc::UnboundedSender<SessionEvent>, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if events.send(SessionEvent::Tick { generation }).is_err() {
                break;
            }
        }
    })
}

fn spawn_delay(
    events: mpsc::UnboundedSender<SessionEvent>,
    generation: u64,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        post(&events, SessionEvent::DelayElapsed { generation });
    })
}
