use crate::{
    tests::fakes::{CountingPreview, Counters, FakeWriter, n, solid},
    writer::{PreviewWriter, VideoFileWriter, WriterCapabilities},
};

use std::{sync::Arc, time::Duration};

/// WHAT: Frames reach both the file and the preview; dispose forwards once
/// WHY: The preview must never hold the output open or flush it twice
#[test]
#[allow(clippy::unwrap_used)]
fn given_preview_writer_when_writing_and_disposing_twice_then_mirrored_and_flushed_once() {
    // Given: A preview wrapper over a counting writer
    let counters = Arc::new(Counters::default());
    let preview = Arc::new(CountingPreview::default());
    let caps = WriterCapabilities {
        required_encoder: None,
        carries_audio: false,
        variable_frame_rate: true,
    };
    let mut writer = PreviewWriter::new(
        Box::new(FakeWriter::new(Arc::clone(&counters), caps, false)),
        preview.clone(),
    );

    // When: Writing two frames and disposing twice
    writer
        .write_frame(&solid([1, 2, 3, 255]), Duration::from_millis(100))
        .unwrap();
    writer
        .write_frame(&solid([4, 5, 6, 255]), Duration::from_millis(100))
        .unwrap();
    writer.dispose().unwrap();
    writer.dispose().unwrap();

    // Then: Both frames mirrored, one disposal, capabilities forwarded
    assert_eq!(counters.written().len(), 2);
    assert_eq!(n(&preview.shown), 2);
    assert_eq!(n(&counters.writer_disposals), 1);
    assert!(writer.capabilities().variable_frame_rate);
}
