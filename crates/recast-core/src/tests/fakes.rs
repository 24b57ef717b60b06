//! Counting fakes for every capability the orchestrator consumes.

use crate::{
    CaptureError, CaptureResult, Orchestrator, OrchestratorDeps, SessionEvent, SessionPlan,
    SessionSettings,
    capture::{
        AudioChunk, AudioProvider, AudioSource, Frame, ImageProvider, OpenedSource, SourceKind,
        SourceSelection, VideoSource, WaveFormat, identity_transform,
    },
    overlay::OverlayDeps,
    session::{ClickAction, MessageSurface, RegionLock, Shell},
    writer::{
        AudioFileWriter, AudioTarget, EncoderProbe, ExternalEncoder, PreviewSurface,
        VideoFileWriter, VideoWriterArgs, WriterCapabilities, WriterKind,
    },
};

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use image::Rgba;
use tempfile::TempDir;
use tokio::{sync::mpsc, time::timeout};

pub(crate) fn n(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

fn drop_one(counter: &AtomicUsize) {
    counter.fetch_sub(1, Ordering::SeqCst);
}

fn locked<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// A 4x4 frame filled with one color.
pub(crate) fn solid(color: [u8; 4]) -> Frame {
    Frame::from_pixel(4, 4, Rgba(color))
}

#[derive(Default)]
pub(crate) struct Counters {
    pub sources_opened: AtomicUsize,
    pub live_images: AtomicUsize,
    pub captures: AtomicUsize,
    pub timeouts_set: AtomicUsize,
    pub audio_opened: AtomicUsize,
    pub live_audio: AtomicUsize,
    pub writers_created: AtomicUsize,
    pub live_writers: AtomicUsize,
    pub writer_disposals: AtomicUsize,
    pub written: Mutex<Vec<(Rgba<u8>, Duration)>>,
}

impl Counters {
    pub fn written(&self) -> Vec<(Rgba<u8>, Duration)> {
        locked(&self.written).clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CaptureFault {
    None,
    Device,
    Cancel,
}

pub(crate) struct FakeImages {
    counters: Arc<Counters>,
    script: VecDeque<Frame>,
    last: Frame,
    fault: CaptureFault,
}

impl FakeImages {
    pub fn new(counters: Arc<Counters>, script: Vec<Frame>, fault: CaptureFault) -> Self {
        bump(&counters.live_images);
        Self {
            counters,
            script: script.into(),
            last: solid([255, 255, 255, 255]),
            fault,
        }
    }
}

impl Drop for FakeImages {
    fn drop(&mut self) {
        drop_one(&self.counters.live_images);
    }
}

impl ImageProvider for FakeImages {
    fn width(&self) -> u32 {
        self.last.width()
    }

    fn height(&self) -> u32 {
        self.last.height()
    }

    fn capture(&mut self) -> CaptureResult<Frame> {
        bump(&self.counters.captures);
        match self.fault {
            CaptureFault::Device => return Err(CaptureError::device("screen went away")),
            CaptureFault::Cancel => return Err(CaptureError::cancelled()),
            CaptureFault::None => {}
        }
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        Ok(self.last.clone())
    }

    fn set_timeout(&mut self, _timeout: Duration) -> bool {
        bump(&self.counters.timeouts_set);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenBehaviour {
    Provide,
    Dismiss,
    NotSupported,
    Fail,
}

pub(crate) struct FakeVideoSource {
    pub kind: SourceKind,
    pub counters: Arc<Counters>,
    pub behaviour: OpenBehaviour,
    pub fault: CaptureFault,
    pub script: Vec<Frame>,
}

impl VideoSource for FakeVideoSource {
    fn name(&self) -> &str {
        "fake screen"
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn open(&self, _include_cursor: bool) -> CaptureResult<Option<OpenedSource>> {
        match self.behaviour {
            OpenBehaviour::Dismiss => Ok(None),
            OpenBehaviour::NotSupported => Err(CaptureError::not_supported("needs Windows 8")),
            OpenBehaviour::Fail => Err(CaptureError::device("no display")),
            OpenBehaviour::Provide => {
                bump(&self.counters.sources_opened);
                Ok(Some(OpenedSource {
                    provider: Box::new(FakeImages::new(
                        Arc::clone(&self.counters),
                        self.script.clone(),
                        self.fault,
                    )),
                    transform: identity_transform(),
                }))
            }
        }
    }
}

pub(crate) struct FakeWriter {
    counters: Arc<Counters>,
    caps: WriterCapabilities,
    fail_dispose: bool,
    disposed: bool,
}

impl FakeWriter {
    pub fn new(counters: Arc<Counters>, caps: WriterCapabilities, fail_dispose: bool) -> Self {
        bump(&counters.writers_created);
        bump(&counters.live_writers);
        Self {
            counters,
            caps,
            fail_dispose,
            disposed: false,
        }
    }
}

impl Drop for FakeWriter {
    fn drop(&mut self) {
        drop_one(&self.counters.live_writers);
    }
}

impl VideoFileWriter for FakeWriter {
    fn capabilities(&self) -> WriterCapabilities {
        self.caps
    }

    fn write_frame(&mut self, frame: &Frame, duration: Duration) -> CaptureResult<()> {
        locked(&self.counters.written).push((*frame.get_pixel(0, 0), duration));
        Ok(())
    }

    fn dispose(&mut self) -> CaptureResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        bump(&self.counters.writer_disposals);
        if self.fail_dispose {
            return Err(CaptureError::encode("disk full"));
        }
        Ok(())
    }
}

pub(crate) struct FakeWriterKind {
    pub counters: Arc<Counters>,
    pub caps: WriterCapabilities,
    pub extension: &'static str,
    pub fail_create: bool,
    pub fail_dispose: bool,
}

impl WriterKind for FakeWriterKind {
    fn name(&self) -> &str {
        "fake writer"
    }

    fn extension(&self) -> &str {
        self.extension
    }

    fn capabilities(&self) -> WriterCapabilities {
        self.caps
    }

    fn create(&self, _args: VideoWriterArgs) -> CaptureResult<Box<dyn VideoFileWriter>> {
        if self.fail_create {
            return Err(CaptureError::encode("codec refused"));
        }
        Ok(Box::new(FakeWriter::new(
            Arc::clone(&self.counters),
            self.caps,
            self.fail_dispose,
        )))
    }
}

pub(crate) struct FakeAudio {
    counters: Arc<Counters>,
}

impl Drop for FakeAudio {
    fn drop(&mut self) {
        drop_one(&self.counters.live_audio);
    }
}

impl AudioProvider for FakeAudio {
    fn wave_format(&self) -> WaveFormat {
        WaveFormat {
            sample_rate: 48_000,
            channels: 1,
        }
    }

    fn start(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    fn stop(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    fn read(&mut self) -> CaptureResult<AudioChunk> {
        Ok(AudioChunk::new(vec![0.0; 16]))
    }
}

pub(crate) struct FakeAudioSource {
    pub counters: Arc<Counters>,
}

impl AudioSource for FakeAudioSource {
    fn audio_provider(&self, _frame_rate: u32) -> CaptureResult<Box<dyn AudioProvider>> {
        bump(&self.counters.audio_opened);
        bump(&self.counters.live_audio);
        Ok(Box::new(FakeAudio {
            counters: Arc::clone(&self.counters),
        }))
    }
}

pub(crate) struct FakeAudioFile {
    counters: Arc<Counters>,
    disposed: bool,
}

impl Drop for FakeAudioFile {
    fn drop(&mut self) {
        drop_one(&self.counters.live_writers);
    }
}

impl AudioFileWriter for FakeAudioFile {
    fn write(&mut self, _chunk: &AudioChunk) -> CaptureResult<()> {
        Ok(())
    }

    fn dispose(&mut self) -> CaptureResult<()> {
        if !self.disposed {
            self.disposed = true;
            bump(&self.counters.writer_disposals);
        }
        Ok(())
    }
}

pub(crate) struct FakeAudioTarget {
    pub counters: Arc<Counters>,
}

impl AudioTarget for FakeAudioTarget {
    fn name(&self) -> &str {
        "fake wav"
    }

    fn extension(&self) -> &str {
        ".wav"
    }

    fn create(
        &self,
        _path: &Path,
        _format: WaveFormat,
        _quality: u8,
    ) -> CaptureResult<Box<dyn AudioFileWriter>> {
        bump(&self.counters.writers_created);
        bump(&self.counters.live_writers);
        Ok(Box::new(FakeAudioFile {
            counters: Arc::clone(&self.counters),
            disposed: false,
        }))
    }
}

#[derive(Default)]
pub(crate) struct RecordingMessages {
    pub answer: AtomicBool,
    pub errors: Mutex<Vec<String>>,
    pub questions: Mutex<Vec<String>>,
    pub notifications: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<ClickAction>>,
    pub hides: AtomicUsize,
}

impl RecordingMessages {
    pub fn errors(&self) -> Vec<String> {
        locked(&self.errors).clone()
    }

    pub fn questions(&self) -> Vec<String> {
        locked(&self.questions).clone()
    }

    pub fn notifications(&self) -> Vec<String> {
        locked(&self.notifications).clone()
    }

    /// Run every stored notification click handler.
    pub fn click_all(&self) {
        let clicks: Vec<ClickAction> = locked(&self.clicks).drain(..).collect();
        for click in clicks {
            click();
        }
    }
}

impl MessageSurface for RecordingMessages {
    fn show_error(&self, message: &str) {
        locked(&self.errors).push(message.to_string());
    }

    fn show_yes_no(&self, message: &str, _title: &str) -> bool {
        locked(&self.questions).push(message.to_string());
        self.answer.load(Ordering::SeqCst)
    }

    fn notify(&self, text: &str, on_click: Option<ClickAction>) {
        locked(&self.notifications).push(text.to_string());
        if let Some(click) = on_click {
            locked(&self.clicks).push(click);
        }
    }

    fn hide_notification(&self) {
        bump(&self.hides);
    }
}

#[derive(Default)]
pub(crate) struct RecordingShell {
    pub minimized: Mutex<Vec<bool>>,
    pub copied: Mutex<Vec<String>>,
    pub images: Mutex<Vec<Frame>>,
    pub launched: Mutex<Vec<PathBuf>>,
}

impl RecordingShell {
    pub fn minimized(&self) -> Vec<bool> {
        locked(&self.minimized).clone()
    }

    pub fn copied(&self) -> Vec<String> {
        locked(&self.copied).clone()
    }

    pub fn launched(&self) -> Vec<PathBuf> {
        locked(&self.launched).clone()
    }

    pub fn images(&self) -> Vec<Frame> {
        locked(&self.images).clone()
    }
}

impl Shell for RecordingShell {
    fn set_minimized(&self, minimized: bool) {
        locked(&self.minimized).push(minimized);
    }

    fn copy_text(&self, text: &str) {
        locked(&self.copied).push(text.to_string());
    }

    fn copy_image(&self, image: &Frame) {
        locked(&self.images).push(image.clone());
    }

    fn launch(&self, path: &Path) {
        locked(&self.launched).push(path.to_path_buf());
    }
}

#[derive(Default)]
pub(crate) struct CountingRegion {
    pub locks: AtomicUsize,
    pub releases: AtomicUsize,
}

impl RegionLock for CountingRegion {
    fn lock(&self) {
        bump(&self.locks);
    }

    fn release(&self) {
        bump(&self.releases);
    }
}

#[derive(Default)]
pub(crate) struct CountingPreview {
    pub inits: AtomicUsize,
    pub shown: AtomicUsize,
}

impl PreviewSurface for CountingPreview {
    fn init(&self, _width: u32, _height: u32) {
        bump(&self.inits);
    }

    fn show(&self, _frame: &Frame) {
        bump(&self.shown);
    }
}

pub(crate) struct FakeEncoders {
    pub available: AtomicBool,
    pub probes: AtomicUsize,
}

impl EncoderProbe for FakeEncoders {
    fn is_available(&self, _encoder: ExternalEncoder) -> bool {
        bump(&self.probes);
        self.available.load(Ordering::SeqCst)
    }
}

/// An orchestrator wired to fakes, plus the fakes.
pub(crate) struct Harness {
    pub orchestrator: Orchestrator,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub counters: Arc<Counters>,
    pub messages: Arc<RecordingMessages>,
    pub shell: Arc<RecordingShell>,
    pub region: Arc<CountingRegion>,
    pub preview: Arc<CountingPreview>,
    pub encoders: Arc<FakeEncoders>,
    pub dir: TempDir,
}

impl Harness {
    #[allow(clippy::unwrap_used)]
    pub fn new() -> Self {
        let counters = Arc::new(Counters::default());
        let messages = Arc::new(RecordingMessages::default());
        let shell = Arc::new(RecordingShell::default());
        let region = Arc::new(CountingRegion::default());
        let preview = Arc::new(CountingPreview::default());
        let encoders = Arc::new(FakeEncoders {
            available: AtomicBool::new(true),
            probes: AtomicUsize::new(0),
        });

        let deps = OrchestratorDeps {
            messages: messages.clone(),
            shell: shell.clone(),
            region: region.clone(),
            preview: preview.clone(),
            encoders: encoders.clone(),
            audio: Arc::new(FakeAudioSource {
                counters: Arc::clone(&counters),
            }),
            overlays: OverlayDeps::default(),
        };
        let (orchestrator, events) = Orchestrator::new(deps);

        Self {
            orchestrator,
            events,
            counters,
            messages,
            shell,
            region,
            preview,
            encoders,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            output_dir: self.dir.path().to_path_buf(),
            frame_rate: 30,
            ..SessionSettings::default()
        }
    }

    pub fn source(&self, kind: SourceKind) -> FakeVideoSource {
        FakeVideoSource {
            kind,
            counters: Arc::clone(&self.counters),
            behaviour: OpenBehaviour::Provide,
            fault: CaptureFault::None,
            script: Vec::new(),
        }
    }

    pub fn writer(&self) -> FakeWriterKind {
        FakeWriterKind {
            counters: Arc::clone(&self.counters),
            caps: WriterCapabilities {
                required_encoder: None,
                carries_audio: true,
                variable_frame_rate: false,
            },
            extension: ".mp4",
            fail_create: false,
            fail_dispose: false,
        }
    }

    pub fn plan(
        &self,
        settings: SessionSettings,
        source: FakeVideoSource,
        writer: FakeWriterKind,
    ) -> SessionPlan {
        SessionPlan {
            settings,
            selection: SourceSelection::Video {
                source: Arc::new(source),
                writer: Arc::new(writer),
            },
            file_name: None,
        }
    }

    pub fn screen_plan(&self, settings: SessionSettings) -> SessionPlan {
        self.plan(settings, self.source(SourceKind::Screen), self.writer())
    }

    pub fn audio_plan(&self, settings: SessionSettings) -> SessionPlan {
        SessionPlan {
            settings,
            selection: SourceSelection::AudioOnly {
                target: Arc::new(FakeAudioTarget {
                    counters: Arc::clone(&self.counters),
                }),
            },
            file_name: None,
        }
    }

    /// Apply every event already queued.
    pub fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.orchestrator.handle_event(event);
        }
    }

    /// Advance (virtual) time in small steps, applying events as they come.
    pub async fn run_for(&mut self, span: Duration) {
        let step = Duration::from_millis(50);
        let mut ran = Duration::ZERO;
        while ran < span {
            tokio::time::sleep(step).await;
            self.drain();
            ran += step;
        }
    }

    /// Apply events until a disposal result has been handled.
    #[allow(clippy::expect_used)]
    pub async fn await_stop(&mut self) {
        loop {
            let event = timeout(Duration::from_secs(30), self.events.recv())
                .await
                .expect("timed out waiting for the recorder to be disposed")
                .expect("session event channel closed");
            let finished = matches!(event, SessionEvent::StopFinished { .. });
            self.orchestrator.handle_event(event);
            if finished {
                return;
            }
        }
    }
}
