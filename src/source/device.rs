//! CPAL-backed microphone capture.
//!
//! `cpal::Stream` is not `Send`, so the stream lives on a dedicated capture
//! thread for its whole lifetime. The audio callback pushes raw samples into
//! a lock-free ring buffer; an async bridge task drains the ring, converts to
//! the session format, and emits fixed-size [`AudioChunk`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, StreamConfig as CpalStreamConfig};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::chunk::AudioChunk;
use crate::config::CaptureSpec;
use crate::error::LiveError;
use crate::format::{downmix_to_mono, resample};
use crate::source::MicrophoneSource;

/// Chunks buffered between the capture bridge and the session loop.
const CHUNK_CHANNEL_CAPACITY: usize = 32;

/// Seconds of audio the callback ring buffer holds at the device rate.
const RING_BUFFER_SECONDS: usize = 2;

/// Which input device to capture from.
#[derive(Debug, Clone)]
enum DeviceSelection {
    /// Use the system default input device.
    Default,
    /// Use a specific device by name.
    Named(String),
}

/// What the capture thread hands back once the stream is running.
struct CaptureReady {
    device_name: String,
    native_rate: u32,
    native_channels: u16,
    consumer: HeapCons<f32>,
}

/// A real microphone captured through CPAL.
///
/// Capture runs at the device's native format; the bridge downmixes to mono
/// and resamples to the requested rate before cutting chunks. The partial
/// chunk left over at shutdown is discarded.
#[must_use]
pub struct Microphone {
    selection: DeviceSelection,
    label: String,
    running: Arc<AtomicBool>,
    capture_thread: Option<std::thread::JoinHandle<()>>,
    bridge: Option<tokio::task::JoinHandle<()>>,
}

impl Microphone {
    /// Captures from the system default input device.
    pub fn default_device() -> Self {
        Self {
            selection: DeviceSelection::Default,
            label: "default input".to_string(),
            running: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            bridge: None,
        }
    }

    /// Captures from a specific input device by name.
    pub fn by_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            selection: DeviceSelection::Named(name.clone()),
            label: name,
            running: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            bridge: None,
        }
    }
}

#[async_trait]
impl MicrophoneSource for Microphone {
    fn name(&self) -> &str {
        &self.label
    }

    async fn open(&mut self, spec: &CaptureSpec) -> Result<mpsc::Receiver<AudioChunk>, LiveError> {
        if self.capture_thread.is_some() {
            return Err(LiveError::BackendError(
                "microphone is already capturing".to_string(),
            ));
        }

        if spec.echo_cancellation || spec.noise_suppression || spec.auto_gain {
            tracing::debug!("capture processing hints are not applied by the CPAL backend");
        }

        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();

        let selection = self.selection.clone();
        let thread_running = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || capture_thread_main(&selection, &thread_running, ready_tx))
            .map_err(|e| LiveError::BackendError(e.to_string()))?;

        let ready = match ready_rx.await {
            Ok(Ok(ready)) => ready,
            Ok(Err(err)) => {
                // The thread exits on its own after reporting failure.
                return Err(err);
            }
            Err(_) => {
                return Err(LiveError::BackendError(
                    "capture thread exited before reporting readiness".to_string(),
                ));
            }
        };

        tracing::info!(
            device = %ready.device_name,
            native_rate = ready.native_rate,
            native_channels = ready.native_channels,
            target_rate = spec.sample_rate,
            "microphone capture started"
        );

        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let bridge = tokio::spawn(run_bridge(
            ready.consumer,
            ready.native_rate,
            ready.native_channels,
            *spec,
            Arc::clone(&running),
            chunk_tx,
        ));

        self.label = ready.device_name;
        self.running = running;
        self.capture_thread = Some(thread);
        self.bridge = Some(bridge);

        Ok(chunk_rx)
    }

    async fn close(&mut self) {
        self.running.store(false, Ordering::Relaxed);

        if let Some(thread) = self.capture_thread.take() {
            // Joining blocks until the stream is dropped on its owning thread.
            match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::warn!("microphone capture thread panicked"),
                Err(e) => tracing::warn!("failed to join capture thread: {e}"),
            }
        }

        if let Some(bridge) = self.bridge.take() {
            if let Err(e) = bridge.await {
                tracing::debug!("capture bridge ended abnormally: {e}");
            }
        }
    }
}

impl Drop for Microphone {
    fn drop(&mut self) {
        // The capture thread parks on this flag; flipping it is enough for
        // the thread to wind down even if close() was never awaited.
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Entry point of the dedicated capture thread.
///
/// Resolves the device, builds and starts the stream, reports readiness, then
/// parks until the running flag clears. All CPAL types stay on this thread.
fn capture_thread_main(
    selection: &DeviceSelection,
    running: &AtomicBool,
    ready_tx: oneshot::Sender<Result<CaptureReady, LiveError>>,
) {
    let started = start_stream(selection);
    let (stream, ready) = match started {
        Ok(pair) => pair,
        Err(err) => {
            let _ = ready_tx.send(Err(err));
            return;
        }
    };

    if ready_tx.send(Ok(ready)).is_err() {
        // open() gave up waiting; drop the stream and bail.
        drop(stream);
        return;
    }

    while running.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(10));
    }

    drop(stream);
    tracing::debug!("microphone capture thread stopped");
}

/// Opens the device and starts a running input stream.
fn start_stream(
    selection: &DeviceSelection,
) -> Result<(cpal::Stream, CaptureReady), LiveError> {
    let device = resolve_device(selection)?;
    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let supported_config = device
        .default_input_config()
        .map_err(|e| LiveError::BackendError(e.to_string()))?;

    let native_rate = supported_config.sample_rate().0;
    let native_channels = supported_config.channels();
    let sample_format = supported_config.sample_format();
    let cpal_config: CpalStreamConfig = supported_config.into();

    let capacity = native_rate as usize * native_channels as usize * RING_BUFFER_SECONDS;
    let ring_buffer = HeapRb::<f32>::new(capacity);
    let (producer, consumer) = ring_buffer.split();

    // Build stream based on sample format
    let stream = match sample_format {
        SampleFormat::F32 => build_f32_stream(&device, &cpal_config, producer)?,
        SampleFormat::I16 => build_i16_stream(&device, &cpal_config, producer)?,
        format => {
            return Err(LiveError::UnsupportedFormat {
                format: format!("{format:?}"),
            });
        }
    };

    stream
        .play()
        .map_err(|e| LiveError::BackendError(e.to_string()))?;

    Ok((
        stream,
        CaptureReady {
            device_name,
            native_rate,
            native_channels,
            consumer,
        },
    ))
}

/// Resolves the CPAL device for a selection.
fn resolve_device(selection: &DeviceSelection) -> Result<Device, LiveError> {
    let host = cpal::default_host();
    match selection {
        DeviceSelection::Default => host
            .default_input_device()
            .ok_or(LiveError::NoDefaultDevice),
        DeviceSelection::Named(name) => {
            let devices = host
                .input_devices()
                .map_err(|e| LiveError::BackendError(e.to_string()))?;

            for device in devices {
                if let Ok(device_name) = device.name() {
                    if device_name == *name {
                        return Ok(device);
                    }
                }
            }

            Err(LiveError::DeviceNotFound { name: name.clone() })
        }
    }
}

fn build_f32_stream(
    device: &Device,
    config: &CpalStreamConfig,
    mut producer: HeapProd<f32>,
) -> Result<cpal::Stream, LiveError> {
    let stream = device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Non-blocking push - drops samples if buffer is full
                let _ = producer.push_slice(data);
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| LiveError::BackendError(e.to_string()))?;

    Ok(stream)
}

fn build_i16_stream(
    device: &Device,
    config: &CpalStreamConfig,
    mut producer: HeapProd<f32>,
) -> Result<cpal::Stream, LiveError> {
    let stream = device
        .build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // Inline conversion to avoid function call overhead in audio callback
                for &sample in data {
                    let _ = producer.try_push(f32::from(sample) / 32768.0);
                }
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| LiveError::BackendError(e.to_string()))?;

    Ok(stream)
}

/// Drains the callback ring buffer and cuts fixed-size session chunks.
async fn run_bridge(
    mut consumer: HeapCons<f32>,
    native_rate: u32,
    native_channels: u16,
    spec: CaptureSpec,
    running: Arc<AtomicBool>,
    tx: mpsc::Sender<AudioChunk>,
) {
    let mut pending: Vec<f32> = Vec::new();
    let mut samples_sent: u64 = 0;

    let mut interval = tokio::time::interval(poll_interval(&spec));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let stopping = !running.load(Ordering::Relaxed);

        let available = consumer.occupied_len();
        if available > 0 {
            let mut raw = Vec::with_capacity(available);
            while let Some(sample) = consumer.try_pop() {
                raw.push(sample);
            }

            let mono = downmix_to_mono(&raw, native_channels);
            pending.extend_from_slice(&resample(&mono, native_rate, spec.sample_rate));
        }

        while pending.len() >= spec.chunk_size {
            let samples: Vec<f32> = pending.drain(..spec.chunk_size).collect();
            let timestamp =
                Duration::from_secs_f64(samples_sent as f64 / f64::from(spec.sample_rate));
            samples_sent += spec.chunk_size as u64;

            let chunk = AudioChunk::new(samples, timestamp, spec.sample_rate);
            match tx.try_send(chunk) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // The session loop is behind; realtime capture drops
                    // rather than stalls.
                    tracing::warn!("capture chunk dropped: channel full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => return,
            }
        }

        if stopping {
            if !pending.is_empty() {
                tracing::debug!(
                    samples = pending.len(),
                    "discarding partial chunk at shutdown"
                );
            }
            return;
        }
    }
}

/// Half a chunk's worth of wall time between ring buffer drains.
fn poll_interval(spec: &CaptureSpec) -> Duration {
    let chunk_secs = spec.chunk_size as f64 / f64::from(spec.sample_rate);
    Duration::from_secs_f64(chunk_secs / 2.0).max(Duration::from_millis(1))
}
