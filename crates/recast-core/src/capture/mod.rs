//! Capture provider capabilities.
//!
//! Concrete screen, window and audio backends live outside this crate and
//! plug in through these traits.

mod frame;
mod provider;
mod source;

pub use {
    frame::{AudioChunk, Frame, Point, PointTransform, Rect, WaveFormat, identity_transform},
    provider::{AudioProvider, AudioSource, ImageProvider},
    source::{OpenedSource, SourceKind, SourceSelection, VideoSource},
};
