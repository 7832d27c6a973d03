// Core types shared by every stage of the pipeline.

/// One video frame / drawing layer.
#[derive(Clone, PartialEq, Debug)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is (pixels)
    pub height: usize,     // how tall the frame is (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB
}

impl FrameBuffer {
    /// An all-black buffer of the given size (the "empty layer" value).
    pub fn zeroed(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// A zeroed buffer with the same dimensions as `other`.
    pub fn zeroed_like(other: &FrameBuffer) -> Self {
        Self::zeroed(other.width, other.height)
    }
}

/// A pixel position inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// What the detector saw this frame. Green is the drawing marker and is
/// always resolved first; red is only looked for when green is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerReading {
    pub green: Option<Point>,
    pub red: Option<Point>,
}
