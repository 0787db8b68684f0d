//! Audio capture: device abstraction, the capture session, and PCM helpers.

pub mod capture;
pub mod device;
pub mod normalize;

pub use capture::{AudioBuffer, CaptureConfig, CaptureError, Recorder};
pub use device::{AudioDevice, Chunk, ChunkReadError, CpalBackend, DeviceBackend};
