//! Concrete capture and writer backends for the desktop host.

mod ffmpeg_writer;
mod gif_writer;
mod microphone;
mod pointer;
mod screen;
mod wav_target;

pub(crate) use {
    ffmpeg_writer::{CommandProbe, FfmpegWriterKind},
    gif_writer::GifWriterKind,
    microphone::MicrophoneSource,
    pointer::EnigoPointer,
    screen::{MonitorSource, UnsupportedSource, WindowSource},
    wav_target::WavTarget,
};

#[cfg(test)]
pub(crate) use {
    ffmpeg_writer::{FfmpegWriter, audio_bitrate_kbps, crf},
    gif_writer::gif_speed,
    pointer::{draw_cursor, pack, unpack},
    screen::fit_frame,
};

use crate::config::{Config, VideoFormat};

use recast_core::{
    SessionPlan,
    capture::{SourceKind, SourceSelection, VideoSource},
    overlay::PointerTracker,
    writer::WriterKind,
};

use std::sync::Arc;

use tracing::warn;

/// Pick the source and writer family the config asks for. `pointer` feeds
/// the cursor drawn when `include_cursor` is set.
pub(crate) fn selection(
    config: &Config,
    pointer: Option<Arc<dyn PointerTracker>>,
) -> SourceSelection {
    let video = &config.video;

    let source: Arc<dyn VideoSource> = match video.source {
        SourceKind::NoVideo => {
            return SourceSelection::AudioOnly {
                target: Arc::new(WavTarget),
            };
        }
        SourceKind::Screen => Arc::new(MonitorSource {
            monitor: video.monitor.clone(),
            region: None,
            pointer,
        }),
        SourceKind::Region => {
            if video.region.is_none() {
                warn!("Region source selected without a region; recording the whole monitor");
            }
            Arc::new(MonitorSource {
                monitor: video.monitor.clone(),
                region: video.region,
                pointer,
            })
        }
        SourceKind::Window => match &video.window_title {
            Some(title) => Arc::new(WindowSource {
                title: title.clone(),
                pointer,
            }),
            None => {
                warn!("Window source selected without a title; recording the primary monitor");
                Arc::new(MonitorSource {
                    monitor: None,
                    region: None,
                    pointer,
                })
            }
        },
        kind @ (SourceKind::DesktopDuplication | SourceKind::Webcam) => {
            Arc::new(UnsupportedSource(kind))
        }
    };

    let writer: Arc<dyn WriterKind> = match video.format {
        VideoFormat::Gif => Arc::new(GifWriterKind),
        VideoFormat::Mp4 => Arc::new(FfmpegWriterKind),
    };

    SourceSelection::Video { source, writer }
}

/// Everything one session needs, built from the current config.
pub(crate) fn session_plan(
    config: &Config,
    pointer: Option<Arc<dyn PointerTracker>>,
) -> SessionPlan {
    SessionPlan {
        settings: config.session_settings(),
        selection: selection(config, pointer),
        file_name: None,
    }
}
