//! Audio input device abstraction and the cpal backend.
//!
//! A `DeviceBackend` opens an `AudioDevice` for a capture session; the device
//! hands out fixed-size interleaved i16 chunks through blocking reads with a
//! bounded wait. cpal streams are not `Send`, so the cpal backend keeps the
//! stream on its own thread and bridges chunks over a bounded channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;
use tracing::{debug, error, info};

use super::capture::{CaptureConfig, CaptureError};

/// One device read's worth of interleaved i16 PCM samples.
pub type Chunk = Vec<i16>;

/// How long `open()` waits for the audio host before giving up.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Chunks buffered between the stream thread and the reader before drops.
const CHANNEL_DEPTH: usize = 64;

/// Why a single chunk read produced no data.
#[derive(Debug, Error)]
pub enum ChunkReadError {
    /// The device dropped data; the stream is still usable.
    #[error("device buffer overflow, chunk dropped")]
    Overflow,
    /// Nothing arrived within the wait window; the stream is still usable.
    #[error("no audio data within {0:?}")]
    Timeout(Duration),
    /// The device went away; no further reads will succeed.
    #[error("audio device closed")]
    Closed,
}

/// An open, recording audio input.
pub trait AudioDevice: Send {
    /// Blocking-read one chunk, waiting at most `wait`.
    fn read_chunk(&mut self, wait: Duration) -> Result<Chunk, ChunkReadError>;
}

/// Opens audio devices for capture sessions.
pub trait DeviceBackend: Send + Sync {
    fn open(&self, config: &CaptureConfig) -> Result<Box<dyn AudioDevice>, CaptureError>;

    fn name(&self) -> &'static str;
}

/// Production backend over the platform's default audio host.
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBackend for CpalBackend {
    fn open(&self, config: &CaptureConfig) -> Result<Box<dyn AudioDevice>, CaptureError> {
        let (chunk_tx, chunk_rx) = mpsc::sync_channel::<Chunk>(CHANNEL_DEPTH);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<String, String>>();
        let stop = Arc::new(AtomicBool::new(false));

        let thread_config = config.clone();
        let thread_stop = stop.clone();
        std::thread::Builder::new()
            .name("minuter-stream".to_string())
            .spawn(move || run_stream(thread_config, chunk_tx, ready_tx, thread_stop))
            .map_err(|e| {
                CaptureError::DeviceUnavailable(format!("failed to spawn stream thread: {e}"))
            })?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(device_name)) => {
                info!("Capture device opened: {}", device_name);
                Ok(Box::new(CpalDevice {
                    chunks: chunk_rx,
                    stop,
                }))
            }
            Ok(Err(reason)) => Err(CaptureError::DeviceUnavailable(reason)),
            Err(_) => Err(CaptureError::DeviceUnavailable(
                "audio host did not respond".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

struct CpalDevice {
    chunks: Receiver<Chunk>,
    stop: Arc<AtomicBool>,
}

impl AudioDevice for CpalDevice {
    fn read_chunk(&mut self, wait: Duration) -> Result<Chunk, ChunkReadError> {
        match self.chunks.recv_timeout(wait) {
            Ok(chunk) => Ok(chunk),
            Err(RecvTimeoutError::Timeout) => Err(ChunkReadError::Timeout(wait)),
            Err(RecvTimeoutError::Disconnected) => Err(ChunkReadError::Closed),
        }
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Owns the cpal stream for the lifetime of the capture. Runs on its own
/// thread; reports open success/failure once over `ready_tx`, then idles
/// until the stop flag is set.
fn run_stream(
    config: CaptureConfig,
    chunk_tx: SyncSender<Chunk>,
    ready_tx: mpsc::Sender<Result<String, String>>,
    stop: Arc<AtomicBool>,
) {
    let host = cpal::default_host();
    let device = match find_device(&host, config.device.as_deref()) {
        Ok(device) => device,
        Err(reason) => {
            let _ = ready_tx.send(Err(reason));
            return;
        }
    };

    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    // The callback delivers arbitrary buffer sizes; regroup into the
    // configured fixed chunk size before handing over.
    let samples_per_chunk = config.samples_per_chunk();
    let mut pending: Vec<i16> = Vec::with_capacity(samples_per_chunk);
    let err_fn = |err| error!("Audio stream error: {}", err);

    let stream = match device.build_input_stream(
        &stream_config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            for &sample in data {
                pending.push(sample);
                if pending.len() == samples_per_chunk {
                    let chunk =
                        std::mem::replace(&mut pending, Vec::with_capacity(samples_per_chunk));
                    if chunk_tx.try_send(chunk).is_err() {
                        // Reader fell behind; drop the chunk rather than
                        // stall the audio callback.
                        debug!("Chunk channel full, dropping one chunk");
                    }
                }
            }
        },
        err_fn,
        None,
    ) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("failed to build input stream: {e}")));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(format!("failed to start input stream: {e}")));
        return;
    }

    let _ = ready_tx.send(Ok(device_name));

    while !stop.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(50));
    }

    drop(stream);
    debug!("Stream thread exiting");
}

fn find_device(host: &cpal::Host, selector: Option<&str>) -> Result<cpal::Device, String> {
    match selector {
        None => host
            .default_input_device()
            .ok_or_else(|| "no default input device".to_string()),
        Some(wanted) => {
            let mut devices = host
                .input_devices()
                .map_err(|e| format!("failed to enumerate input devices: {e}"))?;
            devices
                .find(|d| d.name().map(|n| n.contains(wanted)).unwrap_or(false))
                .ok_or_else(|| format!("no input device matching '{wanted}'"))
        }
    }
}
