use crate::{
    CaptureError, CaptureResult,
    capture::{AudioSource, Frame, ImageProvider},
    recorder::{
        AudioJob, AudioRecorder, FrameJob, FrameRecorder, PumpJob, Recorder, VfrJob,
        fault_channel,
    },
    tests::fakes::{
        CaptureFault, Counters, FakeAudioSource, FakeAudioTarget, FakeImages, FakeWriter, n,
        solid,
    },
    writer::{AudioTarget, WriterCapabilities},
};

use std::{
    path::Path,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use image::Rgba;
use tokio::sync::mpsc;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn caps() -> WriterCapabilities {
    WriterCapabilities::default()
}

type Faults = mpsc::UnboundedReceiver<CaptureError>;

fn frame_recorder(counters: &Arc<Counters>, fault: CaptureFault) -> (FrameRecorder, Faults) {
    let (faults, rx) = fault_channel();
    let job = FrameJob::new(
        Box::new(FakeImages::new(Arc::clone(counters), Vec::new(), fault)),
        Box::new(FakeWriter::new(Arc::clone(counters), caps(), false)),
        None,
        30,
    );
    (FrameRecorder::new(job, faults), rx)
}

/// WHAT: Unchanged frames are coalesced into one write with the held time
/// WHY: Variable frame rate output must not store duplicates
#[test]
#[allow(clippy::unwrap_used)]
fn given_repeated_frames_when_pumping_vfr_then_each_distinct_frame_written_once() {
    // Given: A source showing A, A, B, B, B, C
    let counters = Arc::new(Counters::default());
    let script = vec![
        solid(RED),
        solid(RED),
        solid(GREEN),
        solid(GREEN),
        solid(GREEN),
        solid(BLUE),
    ];
    let mut job = VfrJob::new(
        Box::new(FakeImages::new(Arc::clone(&counters), script, CaptureFault::None)),
        Box::new(FakeWriter::new(Arc::clone(&counters), caps(), false)),
        1000,
    );

    // When: Stepping through the script and finishing
    job.resume().unwrap();
    for _ in 0..6 {
        job.step().unwrap();
    }
    job.finish().unwrap();

    // Then: Three writes, in order, and the writer disposed
    let colors: Vec<Rgba<u8>> = counters.written().into_iter().map(|(c, _)| c).collect();
    assert_eq!(colors, vec![Rgba(RED), Rgba(GREEN), Rgba(BLUE)]);
    assert_eq!(n(&counters.writer_disposals), 1);
    assert_eq!(n(&counters.live_images), 0);
}

/// WHAT: Suspending a VFR job flushes the held frame
/// WHY: Time spent paused must not be added to the frame on screen
#[test]
#[allow(clippy::unwrap_used)]
fn given_held_frame_when_suspending_vfr_then_frame_written_before_pause() {
    // Given: One captured frame
    let counters = Arc::new(Counters::default());
    let mut job = VfrJob::new(
        Box::new(FakeImages::new(
            Arc::clone(&counters),
            vec![solid(RED)],
            CaptureFault::None,
        )),
        Box::new(FakeWriter::new(Arc::clone(&counters), caps(), false)),
        10,
    );
    job.step().unwrap();
    assert!(counters.written().is_empty());

    // When: Suspending
    job.suspend().unwrap();

    // Then: The held frame is written
    assert_eq!(counters.written().len(), 1);
}

/// WHAT: Constant rate frames last exactly one frame interval
/// WHY: Writers derive timestamps from the durations
#[test]
#[allow(clippy::unwrap_used)]
fn given_thirty_fps_when_stepping_frame_job_then_duration_is_interval() {
    // Given: A 30 fps job
    let counters = Arc::new(Counters::default());
    let mut job = FrameJob::new(
        Box::new(FakeImages::new(Arc::clone(&counters), Vec::new(), CaptureFault::None)),
        Box::new(FakeWriter::new(Arc::clone(&counters), caps(), false)),
        None,
        30,
    );

    // When: Stepping twice
    job.step().unwrap();
    job.step().unwrap();

    // Then: Both writes carry 1/30 s
    let interval = Duration::from_secs(1) / 30;
    assert!(counters.written().iter().all(|(_, d)| *d == interval));
    assert_eq!(counters.written().len(), 2);
}

/// Provider whose captures take longer than a frame interval.
struct SlowImages {
    inner: FakeImages,
    delay: Duration,
}

impl ImageProvider for SlowImages {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn capture(&mut self) -> CaptureResult<Frame> {
        thread::sleep(self.delay);
        self.inner.capture()
    }
}

fn media_time(counters: &Counters) -> Duration {
    counters.written().iter().map(|(_, d)| *d).sum()
}

/// WHAT: A capture slower than the interval repeats frames to keep up with the clock
/// WHY: A short video timeline truncates the audio muxed against it
#[test]
#[allow(clippy::unwrap_used)]
fn given_slow_source_when_stepping_frame_job_then_timeline_tracks_wall_clock() {
    // Given: A 30 fps job whose captures take 100 ms
    let counters = Arc::new(Counters::default());
    let images = SlowImages {
        inner: FakeImages::new(Arc::clone(&counters), Vec::new(), CaptureFault::None),
        delay: Duration::from_millis(100),
    };
    let mut job = FrameJob::new(
        Box::new(images),
        Box::new(FakeWriter::new(Arc::clone(&counters), caps(), false)),
        None,
        30,
    );

    // When: Stepping for about half a second
    let began = Instant::now();
    job.resume().unwrap();
    while began.elapsed() < Duration::from_millis(500) {
        job.step().unwrap();
    }
    let wall = began.elapsed();

    // Then: The written timeline covers the wall clock within one frame
    let interval = Duration::from_secs(1) / 30;
    let media = media_time(&counters);
    assert!(media + interval >= wall, "media {media:?} behind wall {wall:?}");
    assert!(media <= wall + interval, "media {media:?} ahead of wall {wall:?}");
    assert!(counters.written().len() > n(&counters.captures));
}

/// WHAT: Time spent suspended is not written to the timeline
/// WHY: Resuming must continue the video where it paused
#[test]
#[allow(clippy::unwrap_used)]
fn given_suspended_frame_job_when_resumed_then_pause_not_written() {
    // Given: A 30 fps job that ran one step and was suspended
    let counters = Arc::new(Counters::default());
    let mut job = FrameJob::new(
        Box::new(FakeImages::new(Arc::clone(&counters), Vec::new(), CaptureFault::None)),
        Box::new(FakeWriter::new(Arc::clone(&counters), caps(), false)),
        None,
        30,
    );
    job.resume().unwrap();
    job.step().unwrap();
    job.suspend().unwrap();

    // When: Resuming after a pause longer than several intervals
    thread::sleep(Duration::from_millis(150));
    job.resume().unwrap();
    job.step().unwrap();

    // Then: One frame per step
    assert_eq!(counters.written().len(), 2);
    assert_eq!(media_time(&counters), Duration::from_secs(1) / 30 * 2);
}

/// WHAT: Disposing a recorder that never started releases everything
/// WHY: A stop during the start delay must still close the file
#[test]
#[allow(clippy::unwrap_used)]
fn given_recorder_never_started_when_disposed_then_writer_flushed_and_nothing_captured() {
    // Given: A fresh recorder
    let counters = Arc::new(Counters::default());
    let (mut recorder, _rx) = frame_recorder(&counters, CaptureFault::None);

    // When: Disposing without starting
    recorder.dispose().unwrap();

    // Then: No captures, one disposal, providers released
    assert_eq!(n(&counters.captures), 0);
    assert_eq!(n(&counters.writer_disposals), 1);
    assert_eq!(n(&counters.live_images), 0);
    assert_eq!(n(&counters.live_writers), 0);
}

/// WHAT: dispose is idempotent and start after dispose fails
/// WHY: Stop and drop can both reach dispose
#[test]
#[allow(clippy::unwrap_used)]
fn given_running_recorder_when_disposed_twice_then_writer_disposed_once() {
    // Given: A running recorder
    let counters = Arc::new(Counters::default());
    let (mut recorder, _rx) = frame_recorder(&counters, CaptureFault::None);
    recorder.start().unwrap();
    thread::sleep(Duration::from_millis(100));

    // When: Disposing twice, then dropping
    recorder.dispose().unwrap();
    recorder.dispose().unwrap();
    let restarted = recorder.start();
    drop(recorder);

    // Then: One disposal, frames were captured, restart refused
    assert!(n(&counters.captures) > 0);
    assert_eq!(n(&counters.writer_disposals), 1);
    assert_eq!(n(&counters.live_images), 0);
    assert!(restarted.is_err());
}

/// WHAT: Pausing parks the pump
/// WHY: A paused session must not keep writing frames
#[test]
#[allow(clippy::unwrap_used)]
fn given_running_recorder_when_paused_then_no_further_captures() {
    // Given: A running recorder
    let counters = Arc::new(Counters::default());
    let (mut recorder, _rx) = frame_recorder(&counters, CaptureFault::None);
    recorder.start().unwrap();
    thread::sleep(Duration::from_millis(100));

    // When: Pausing and letting the pump settle
    recorder.pause().unwrap();
    thread::sleep(Duration::from_millis(100));
    let at_pause = n(&counters.captures);
    thread::sleep(Duration::from_millis(200));

    // Then: The capture count is frozen
    assert_eq!(n(&counters.captures), at_pause);
    recorder.dispose().unwrap();
}

/// WHAT: Capture failures on the pump thread arrive on the fault channel
/// WHY: The orchestrator force-ends the session from that report
#[test]
#[allow(clippy::unwrap_used)]
fn given_failing_source_when_started_then_fault_reported_and_dispose_still_flushes() {
    // Given: A source that always fails
    let counters = Arc::new(Counters::default());
    let (mut recorder, mut rx) = frame_recorder(&counters, CaptureFault::Device);

    // When: Starting
    recorder.start().unwrap();
    let fault = rx.blocking_recv().unwrap();

    // Then: A device fault, and the writer still closes
    assert!(!fault.is_cancellation());
    recorder.dispose().unwrap();
    assert_eq!(n(&counters.writer_disposals), 1);
}

/// WHAT: Audio recorders release provider and writer on dispose
/// WHY: Audio-only sessions go through the same pump
#[test]
#[allow(clippy::unwrap_used)]
fn given_audio_recorder_when_started_and_disposed_then_device_and_file_released() {
    // Given: An audio recorder over fakes
    let counters = Arc::new(Counters::default());
    let source = FakeAudioSource {
        counters: Arc::clone(&counters),
    };
    let target = FakeAudioTarget {
        counters: Arc::clone(&counters),
    };
    let audio = source.audio_provider(30).unwrap();
    let writer = target
        .create(Path::new("out.wav"), audio.wave_format(), 50)
        .unwrap();
    let (faults, _rx) = fault_channel();
    let mut recorder = AudioRecorder::new(AudioJob::new(audio, writer), faults);

    // When: Running briefly then disposing
    recorder.start().unwrap();
    thread::sleep(Duration::from_millis(120));
    recorder.dispose().unwrap();

    // Then: Everything released
    assert_eq!(n(&counters.writer_disposals), 1);
    assert_eq!(n(&counters.live_audio), 0);
    assert_eq!(n(&counters.live_writers), 0);
}
