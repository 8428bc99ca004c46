//! CPAL-based audio capture backend.
//!
//! CPAL's `Stream` is not `Send`/`Sync`, so a dedicated thread owns it and
//! runs until signaled to stop. The callback downmixes to mono per
//! configured channel and computes an RMS level per 50 ms block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

use crate::clock;
use crate::error::AudioError;

use super::{AudioBackend, LevelSink};

/// Block size target: 50 ms at 48 kHz.
const BLOCK_FRAMES: usize = 2400;

pub struct CpalBackend {
    shutdown_flag: Arc<AtomicBool>,
    stream_thread: std::sync::Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            stream_thread: std::sync::Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    fn rms_to_db(rms: f32) -> f32 {
        if rms > 0.0 {
            20.0 * rms.log10()
        } else {
            -100.0
        }
    }

    /// Downmix a device's interleaved block into `channels` logical input
    /// channels and publish an RMS-derived dB level per channel.
    fn publish_block(
        data: &[f32],
        device_channels: usize,
        configured_channels: usize,
        sink: &Arc<dyn LevelSink>,
    ) {
        let frames = data.len() / device_channels.max(1);
        let use_channels = configured_channels.min(device_channels).max(1);

        let mut sums = vec![0.0f32; use_channels];
        for frame in data.chunks(device_channels).take(frames) {
            for (ch, sum) in sums.iter_mut().enumerate() {
                if let Some(&sample) = frame.get(ch) {
                    *sum += sample * sample;
                }
            }
        }

        let levels = sums
            .into_iter()
            .enumerate()
            .map(|(ch, sum_sq)| {
                let rms = (sum_sq / frames.max(1) as f32).sqrt();
                (ch + 1, Self::rms_to_db(rms))
            })
            .collect();

        sink.publish(levels, clock::now());
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn start(&self, channels: usize, sink: Arc<dyn LevelSink>) -> Result<(), AudioError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(AudioError::AlreadyRunning);
        }

        self.shutdown_flag.store(false, Ordering::SeqCst);

        let shutdown_flag = Arc::clone(&self.shutdown_flag);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), AudioError>>();

        let stream_handle = thread::spawn(move || {
            let host = cpal::default_host();
            let device = match host.default_input_device() {
                Some(d) => d,
                None => {
                    let _ = ready_tx.send(Err(AudioError::NoInputDevice));
                    return;
                }
            };

            let supported_config = match device.default_input_config() {
                Ok(c) => c,
                Err(e) => {
                    let _ = ready_tx.send(Err(AudioError::StreamOpenFailed {
                        reason: format!("failed to get default input config: {}", e),
                    }));
                    return;
                }
            };

            let device_channels = supported_config.channels() as usize;
            let mut config: cpal::StreamConfig = supported_config.config();
            config.buffer_size = cpal::BufferSize::Fixed(BLOCK_FRAMES as u32);

            let err_fn = |err| log::error!("[CpalBackend] stream error: {}", err);
            let shutdown_cb = Arc::clone(&shutdown_flag);
            let sink_cb = Arc::clone(&sink);

            let stream = match supported_config.sample_format() {
                SampleFormat::F32 => device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if shutdown_cb.load(Ordering::Relaxed) {
                            return;
                        }
                        Self::publish_block(data, device_channels, channels, &sink_cb);
                    },
                    err_fn,
                    None,
                ),
                SampleFormat::I16 => device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        if shutdown_cb.load(Ordering::Relaxed) {
                            return;
                        }
                        let floats: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        Self::publish_block(&floats, device_channels, channels, &sink_cb);
                    },
                    err_fn,
                    None,
                ),
                SampleFormat::U16 => device.build_input_stream(
                    &config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        if shutdown_cb.load(Ordering::Relaxed) {
                            return;
                        }
                        let floats: Vec<f32> = data
                            .iter()
                            .map(|&s| (s as f32 - 32768.0) / 32768.0)
                            .collect();
                        Self::publish_block(&floats, device_channels, channels, &sink_cb);
                    },
                    err_fn,
                    None,
                ),
                other => {
                    let _ = ready_tx.send(Err(AudioError::StreamOpenFailed {
                        reason: format!("unsupported sample format: {:?}", other),
                    }));
                    return;
                }
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(AudioError::StreamOpenFailed {
                        reason: format!("failed to build input stream: {}", e),
                    }));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::StreamOpenFailed {
                    reason: format!("failed to start stream: {}", e),
                }));
                return;
            }

            let _ = ready_tx.send(Ok(()));

            while !shutdown_flag.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(50));
            }
        });

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(AudioError::StreamOpenFailed {
                    reason: "timed out waiting for capture stream to start".to_string(),
                });
            }
        }

        let mut handle_guard = self
            .stream_thread
            .lock()
            .map_err(|_| AudioError::LockPoisoned {
                component: "stream_thread".to_string(),
            })?;
        *handle_guard = Some(stream_handle);

        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(AudioError::NotRunning);
        }

        self.shutdown_flag.store(true, Ordering::SeqCst);

        let mut handle_guard = self
            .stream_thread
            .lock()
            .map_err(|_| AudioError::LockPoisoned {
                component: "stream_thread".to_string(),
            })?;
        if let Some(handle) = handle_guard.take() {
            let _ = handle.join();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_silence_is_floor_db() {
        assert_eq!(CpalBackend::rms_to_db(0.0), -100.0);
    }

    #[test]
    fn rms_of_full_scale_is_zero_db() {
        assert!((CpalBackend::rms_to_db(1.0) - 0.0).abs() < 1e-6);
    }
}
