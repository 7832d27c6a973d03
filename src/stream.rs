// Frame producer: the pull-driven loop behind the MJPEG stream.
// Visual expectation: every chunk the consumer pulls is one fully
// composited board frame as a JPEG, wrapped for a
// multipart/x-mixed-replace response. Misses produce latency, never gaps.

use std::time::Duration;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use log::debug;

use crate::board::Board;
use crate::camera::CameraCapture;
use crate::types::FrameBuffer;

const BOUNDARY_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
const CHUNK_TAIL: &[u8] = b"\r\n\r\n";
const JPEG_QUALITY: u8 = 80;

// Breather between retries; a dead device must not spin the loop hot.
const MISS_BACKOFF: Duration = Duration::from_millis(10);

/// Owns the capture handle and the drawing session for the whole process.
/// The transport drives it one `next_chunk` at a time and never sees a
/// camera or codec hiccup.
pub struct FrameProducer {
    camera: CameraCapture,
    pub board: Board,
}

impl FrameProducer {
    pub fn new(camera: CameraCapture, board: Board) -> Self {
        Self { camera, board }
    }

    /// Fresh drawing session for a newly connected viewer.
    pub fn reset_session(&mut self, mirror: bool) {
        self.board.reset(mirror);
    }

    /// Pull frames until one makes it all the way through the pipeline.
    /// Capture misses and encode failures skip the iteration; neither ever
    /// surfaces to the consumer.
    pub fn next_chunk(&mut self) -> Bytes {
        loop {
            let frame = match self.camera.next_frame() {
                Ok(f) => f,
                Err(e) => {
                    debug!("capture miss: {e}");
                    std::thread::sleep(MISS_BACKOFF);
                    continue;
                }
            };

            let composed = self.board.process_frame(frame);
            match encode_jpeg(&composed) {
                Some(jpeg) => return wrap_chunk(&jpeg),
                None => {
                    debug!("encode failure, dropping frame");
                    continue;
                }
            }
        }
    }
}

/// Serialize a composited frame to JPEG, or None when the codec balks.
pub fn encode_jpeg(frame: &FrameBuffer) -> Option<Vec<u8>> {
    let mut rgb = Vec::with_capacity(frame.width * frame.height * 3);
    for &px in &frame.pixels {
        rgb.push((px >> 16) as u8);
        rgb.push((px >> 8) as u8);
        rgb.push(px as u8);
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode(&rgb, frame.width as u32, frame.height as u32, image::ExtendedColorType::Rgb8)
        .ok()?;
    Some(out)
}

/// Wrap one encoded image in the multipart delimiter the stream uses.
pub fn wrap_chunk(jpeg: &[u8]) -> Bytes {
    let mut chunk = Vec::with_capacity(BOUNDARY_HEADER.len() + jpeg.len() + CHUNK_TAIL.len());
    chunk.extend_from_slice(BOUNDARY_HEADER);
    chunk.extend_from_slice(jpeg);
    chunk.extend_from_slice(CHUNK_TAIL);
    Bytes::from(chunk)
}
