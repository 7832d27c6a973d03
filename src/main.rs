// Chromaboard: an augmented-reality whiteboard in your browser.
// What you SEE at GET /:
// • The live camera image with outlined control zones around the edges.
// • A vivid green object draws; holding it over a zone presses that button.
// • Shape tools preview under the green marker; a red object stamps them.
// • ?flip=true mirrors the feed; ?probe=true shows the raw detector mask.

mod board;
mod camera;
mod compose;
mod draw;
mod error;
mod stream;
mod types;
mod vision;
mod zones;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::thread;

use axum::{
    Router,
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use futures_util::stream::unfold;
use log::{info, warn};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};

use board::Board;
use camera::CameraCapture;
use error::Error;
use stream::FrameProducer;
use zones::ZoneMap;

const CAPTURE_WIDTH: u32 = 640;
const CAPTURE_HEIGHT: u32 = 480;

/// Requests the transport sends to the pipeline thread. The pipeline only
/// ever does what a consumer asked for: reset a session, or produce one
/// chunk. Pull-based, one at a time, no queue of frames anywhere.
enum Command {
    Reset { mirror: Option<bool>, probe: bool },
    Pull { reply: oneshot::Sender<Bytes> },
}

#[derive(Clone)]
struct PipelineHandle {
    tx: mpsc::Sender<Command>,
}

#[derive(Deserialize)]
struct FeedParams {
    flip: Option<bool>,
    probe: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let port = env_number("CHROMABOARD_PORT", 8700) as u16;
    let camera_index = env_number("CHROMABOARD_CAMERA", 0);

    // The only fatal failure: no camera, no board.
    let pipeline = spawn_pipeline(camera_index).await?;

    let app = Router::new().route("/", get(feed)).with_state(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("chromaboard streaming on http://{addr}/");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Server(format!("Bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

/// Start the one pipeline thread that owns the camera and the board for the
/// process lifetime. Capture handles stay on the thread that opened them;
/// the async side only passes messages.
async fn spawn_pipeline(camera_index: u32) -> Result<PipelineHandle, Error> {
    let (tx, mut rx) = mpsc::channel::<Command>(1);
    let (ready_tx, ready_rx) = oneshot::channel::<Result<(u32, u32), Error>>();

    // Detached on purpose: the pipeline runs for the process lifetime.
    let _pipeline_thread = thread::Builder::new()
        .name("board-pipeline".into())
        .spawn(move || {
            let camera = match CameraCapture::new(camera_index, CAPTURE_WIDTH, CAPTURE_HEIGHT) {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(camera.resolution()));

            let mut producer = FrameProducer::new(camera, Board::new(ZoneMap::standard()));
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    Command::Reset { mirror, probe } => {
                        let mirror = mirror.unwrap_or(producer.board.mirror);
                        producer.reset_session(mirror);
                        producer.board.probe_mask = probe;
                    }
                    Command::Pull { reply } => {
                        // A viewer that vanished between asking and
                        // receiving just drops this chunk on the floor.
                        let _ = reply.send(producer.next_chunk());
                    }
                }
            }
        })
        .map_err(|e| Error::Server(format!("Spawn pipeline thread: {e}")))?;

    match ready_rx.await {
        Ok(Ok((w, h))) => {
            info!("camera {camera_index} open at {w}x{h}");
            Ok(PipelineHandle { tx })
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(Error::CameraInit("pipeline thread died during startup".into())),
    }
}

/// GET /: reset the session and stream the board as MJPEG until the
/// viewer goes away.
async fn feed(State(pipeline): State<PipelineHandle>, Query(params): Query<FeedParams>) -> Response {
    let _ = pipeline
        .tx
        .send(Command::Reset {
            mirror: params.flip,
            probe: params.probe.unwrap_or(false),
        })
        .await;

    let chunks = unfold(pipeline, |pipeline| async move {
        let (reply_tx, reply_rx) = oneshot::channel();
        pipeline.tx.send(Command::Pull { reply: reply_tx }).await.ok()?;
        let chunk = reply_rx.await.ok()?;
        Some((Ok::<Bytes, Infallible>(chunk), pipeline))
    });

    (
        [(header::CONTENT_TYPE, "multipart/x-mixed-replace; boundary=frame")],
        Body::from_stream(chunks),
    )
        .into_response()
}

/// Numeric env var with a default; unparsable values warn and fall back.
fn env_number(name: &str, default: u32) -> u32 {
    match std::env::var(name) {
        Err(_) => default,
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{name}={raw} is not a number, using {default}");
            default
        }),
    }
}
