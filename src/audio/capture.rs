//! Capture session: a device, a reader thread, and an append-only buffer.
//!
//! `Recorder::start` opens the device and spawns a thread that blocking-reads
//! fixed-size chunks into a shared buffer until the stop flag is set.
//! `Recorder::stop` signals the flag, waits for the thread with a bounded
//! join, and hands the buffer to the caller exactly once.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::device::{AudioDevice, Chunk, ChunkReadError, DeviceBackend};

/// How long `stop()` waits for the reader thread before abandoning it.
const JOIN_TIMEOUT: Duration = Duration::from_secs(3);

/// Bounded wait for a single chunk read.
const READ_WAIT: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording in progress")]
    NotRecording,
}

/// Immutable capture parameters, chosen once when a session starts.
/// Doubles as the `[capture]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per sample. Capture is 16-bit integer PCM.
    pub sample_width: u16,
    /// Frames per device read.
    pub frames_per_chunk: usize,
    /// Substring match against device names; `None` uses the default input.
    pub device: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 2,
            sample_width: 2,
            frames_per_chunk: 1024,
            device: None,
        }
    }
}

impl CaptureConfig {
    /// Interleaved samples per chunk.
    pub fn samples_per_chunk(&self) -> usize {
        self.frames_per_chunk * self.channels as usize
    }

    /// Seconds of audio represented by one full chunk.
    pub fn chunk_duration(&self) -> f64 {
        self.frames_per_chunk as f64 / self.sample_rate as f64
    }
}

/// PCM captured during one session: an ordered list of fixed-size chunks.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    chunks: Vec<Chunk>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    pub fn new(chunks: Vec<Chunk>, sample_rate: u32, channels: u16) -> Self {
        Self {
            chunks,
            sample_rate,
            channels,
        }
    }

    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total interleaved samples across all chunks.
    pub fn sample_count(&self) -> usize {
        self.chunks.iter().map(|c| c.len()).sum()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Seconds of audio held, derived from the sample count.
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// All samples as one contiguous interleaved slice.
    pub fn interleaved(&self) -> Vec<i16> {
        let mut samples = Vec::with_capacity(self.sample_count());
        for chunk in &self.chunks {
            samples.extend_from_slice(chunk);
        }
        samples
    }

    /// Write the buffer as a 16-bit PCM WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(path, spec)?;
        for chunk in &self.chunks {
            for &sample in chunk {
                writer.write_sample(sample)?;
            }
        }
        writer.finalize()?;

        info!(
            "Session audio saved: {:?} ({:.1}s)",
            path,
            self.duration_seconds()
        );
        Ok(())
    }
}

struct ActiveCapture {
    chunks: Arc<Mutex<Vec<Chunk>>>,
    stop: Arc<AtomicBool>,
    done_rx: mpsc::Receiver<()>,
    handle: Option<JoinHandle<()>>,
    config: CaptureConfig,
    started: Instant,
}

/// Owns the exclusive device handle between `start()` and `stop()`.
pub struct Recorder {
    backend: Arc<dyn DeviceBackend>,
    active: Option<ActiveCapture>,
}

impl Recorder {
    pub fn new(backend: Arc<dyn DeviceBackend>) -> Self {
        Self {
            backend,
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self, config: CaptureConfig) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let mut device = self.backend.open(&config)?;

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = mpsc::channel();

        let thread_chunks = chunks.clone();
        let thread_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("minuter-capture".to_string())
            .spawn(move || {
                read_loop(device.as_mut(), &thread_chunks, &thread_stop);
                let _ = done_tx.send(());
            })
            .map_err(|e| {
                CaptureError::DeviceUnavailable(format!("failed to spawn capture thread: {e}"))
            })?;

        info!(
            "Capture started via {}: {} Hz, {} ch, {} frames/chunk",
            self.backend.name(),
            config.sample_rate,
            config.channels,
            config.frames_per_chunk
        );

        self.active = Some(ActiveCapture {
            chunks,
            stop,
            done_rx,
            handle: Some(handle),
            config,
            started: Instant::now(),
        });

        Ok(())
    }

    pub fn stop(&mut self) -> Result<AudioBuffer, CaptureError> {
        let mut active = self.active.take().ok_or(CaptureError::NotRecording)?;
        active.stop.store(true, Ordering::Relaxed);

        match active.done_rx.recv_timeout(JOIN_TIMEOUT) {
            Ok(()) => {
                if let Some(handle) = active.handle.take() {
                    let _ = handle.join();
                }
            }
            Err(_) => {
                // Abandon the thread; whatever it buffered so far still counts.
                warn!(
                    "Capture thread did not stop within {:?}, abandoning it",
                    JOIN_TIMEOUT
                );
            }
        }

        let chunks = match active.chunks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        let buffer = AudioBuffer::new(chunks, active.config.sample_rate, active.config.channels);
        info!(
            "Capture stopped: {} chunks, {:.1}s of audio, {:.1}s wall time",
            buffer.chunk_count(),
            buffer.duration_seconds(),
            active.started.elapsed().as_secs_f64()
        );

        Ok(buffer)
    }
}

fn read_loop(device: &mut dyn AudioDevice, chunks: &Mutex<Vec<Chunk>>, stop: &AtomicBool) {
    debug!("Capture thread running");

    while !stop.load(Ordering::Relaxed) {
        match device.read_chunk(READ_WAIT) {
            Ok(chunk) => match chunks.lock() {
                Ok(mut guard) => guard.push(chunk),
                Err(poisoned) => poisoned.into_inner().push(chunk),
            },
            // Transient: keep capturing, the session outlives dropped chunks.
            Err(ChunkReadError::Overflow) => warn!("Device overflow, one chunk dropped"),
            Err(ChunkReadError::Timeout(_)) => {}
            Err(ChunkReadError::Closed) => {
                warn!("Audio device closed mid-capture");
                break;
            }
        }
    }

    debug!("Capture thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a scripted sequence of reads, then times out.
    struct ScriptedDevice {
        reads: VecDeque<Result<Chunk, ChunkReadError>>,
    }

    impl AudioDevice for ScriptedDevice {
        fn read_chunk(&mut self, wait: Duration) -> Result<Chunk, ChunkReadError> {
            match self.reads.pop_front() {
                Some(read) => read,
                None => {
                    std::thread::sleep(Duration::from_millis(2));
                    Err(ChunkReadError::Timeout(wait))
                }
            }
        }
    }

    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<Chunk, ChunkReadError>>>,
    }

    impl ScriptedBackend {
        fn new(reads: Vec<Result<Chunk, ChunkReadError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(reads.into()),
            })
        }
    }

    impl DeviceBackend for ScriptedBackend {
        fn open(&self, _config: &CaptureConfig) -> Result<Box<dyn AudioDevice>, CaptureError> {
            let reads = std::mem::take(&mut *self.script.lock().unwrap());
            Ok(Box::new(ScriptedDevice { reads }))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    struct ClosedBackend;

    impl DeviceBackend for ClosedBackend {
        fn open(&self, _config: &CaptureConfig) -> Result<Box<dyn AudioDevice>, CaptureError> {
            Err(CaptureError::DeviceUnavailable("no such device".to_string()))
        }

        fn name(&self) -> &'static str {
            "closed"
        }
    }

    fn settle() {
        std::thread::sleep(Duration::from_millis(100));
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut recorder = Recorder::new(ScriptedBackend::new(vec![]));
        recorder.start(CaptureConfig::default()).unwrap();
        assert!(matches!(
            recorder.start(CaptureConfig::default()),
            Err(CaptureError::AlreadyRecording)
        ));
        // The first capture is unaffected.
        assert!(recorder.is_recording());
        recorder.stop().unwrap();
    }

    #[test]
    fn test_stop_without_start_rejected() {
        let mut recorder = Recorder::new(ScriptedBackend::new(vec![]));
        assert!(matches!(recorder.stop(), Err(CaptureError::NotRecording)));
    }

    #[test]
    fn test_unavailable_device_leaves_recorder_idle() {
        let mut recorder = Recorder::new(Arc::new(ClosedBackend));
        assert!(matches!(
            recorder.start(CaptureConfig::default()),
            Err(CaptureError::DeviceUnavailable(_))
        ));
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_zero_chunks_is_empty_buffer_not_error() {
        let mut recorder = Recorder::new(ScriptedBackend::new(vec![]));
        recorder.start(CaptureConfig::default()).unwrap();
        let buffer = recorder.stop().unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration_seconds(), 0.0);
    }

    #[test]
    fn test_captures_scripted_chunks() {
        let backend = ScriptedBackend::new(vec![
            Ok(vec![1i16; 2048]),
            Ok(vec![2i16; 2048]),
            Ok(vec![3i16; 2048]),
        ]);
        let mut recorder = Recorder::new(backend);
        recorder.start(CaptureConfig::default()).unwrap();
        settle();
        let buffer = recorder.stop().unwrap();

        assert_eq!(buffer.chunk_count(), 3);
        assert_eq!(buffer.sample_count(), 3 * 2048);
        let interleaved = buffer.interleaved();
        assert_eq!(interleaved[0], 1);
        assert_eq!(interleaved[2048], 2);
        assert_eq!(interleaved[2 * 2048], 3);
    }

    #[test]
    fn test_overflow_does_not_abort_capture() {
        let backend = ScriptedBackend::new(vec![
            Ok(vec![1i16; 2048]),
            Err(ChunkReadError::Overflow),
            Ok(vec![2i16; 2048]),
        ]);
        let mut recorder = Recorder::new(backend);
        recorder.start(CaptureConfig::default()).unwrap();
        settle();
        let buffer = recorder.stop().unwrap();
        assert_eq!(buffer.chunk_count(), 2);
    }

    #[test]
    fn test_closed_device_keeps_earlier_chunks() {
        let backend = ScriptedBackend::new(vec![
            Ok(vec![7i16; 2048]),
            Err(ChunkReadError::Closed),
            Ok(vec![8i16; 2048]),
        ]);
        let mut recorder = Recorder::new(backend);
        recorder.start(CaptureConfig::default()).unwrap();
        settle();
        let buffer = recorder.stop().unwrap();
        // The read after the close is never reached.
        assert_eq!(buffer.chunk_count(), 1);
    }

    #[test]
    fn test_duration_matches_chunk_math() {
        let config = CaptureConfig::default();
        let chunk = vec![0i16; config.samples_per_chunk()];
        let backend = ScriptedBackend::new(vec![Ok(chunk.clone()), Ok(chunk.clone()), Ok(chunk)]);
        let mut recorder = Recorder::new(backend);
        recorder.start(config.clone()).unwrap();
        settle();
        let buffer = recorder.stop().unwrap();

        let expected = 3.0 * config.chunk_duration();
        assert!((buffer.duration_seconds() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_write_wav_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.wav");
        let buffer = AudioBuffer::new(vec![vec![0i16, 100, -100, 32_000]], 44_100, 2);
        buffer.write_wav(&path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44_100);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 100, -100, 32_000]);
    }
}
