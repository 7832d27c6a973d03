// A tiny error type so we don't rely on anyhow/thiserror.
// Every variant states *where* things went wrong.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    CameraInit(String),  // Opening/starting the camera failed
    CameraFrame(String), // Grabbing/decoding a frame failed
    Server(String),      // Binding/serving the HTTP endpoint failed
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CameraInit(s) => write!(f, "Camera init error: {s}"),
            Error::CameraFrame(s) => write!(f, "Camera frame error: {s}"),
            Error::Server(s) => write!(f, "Server error: {s}"),
        }
    }
}

impl std::error::Error for Error {}
