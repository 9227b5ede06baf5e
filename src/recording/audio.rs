//! Microphone capture.
//!
//! `MicCapture` opens an input device through cpal, folds multi-channel audio
//! to mono i16, and finalizes the buffered samples into an in-memory WAV
//! artifact on stop. Dropping the cpal stream releases the device, so the
//! OS input indicator goes dark as soon as `stop` returns.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};

use super::artifact::AudioArtifact;
use crate::error::{Result, TabibError};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Device port the recording session drives.
///
/// `start` acquires exclusive access to the input device; `stop` releases it
/// and yields the finalized artifact. `stop` when not started is a no-op
/// returning `None`. `level` reports a rough 0-100 input level for the
/// cosmetic waveform sampler.
pub trait AudioCapture {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<Option<AudioArtifact>>;
    fn is_active(&self) -> bool;
    fn level(&self) -> u8;
}

/// cpal-backed microphone capture.
pub struct MicCapture {
    /// Actual recording sample rate from the device
    sample_rate: u32,
    /// Recorded audio samples (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Active audio input stream (kept alive during recording)
    stream: Option<cpal::Stream>,
    /// Device name, numeric index, or "default"
    device_name: String,
    /// Reference level in dBFS mapped to 100% on the meter
    reference_level_db: i8,
}

impl MicCapture {
    /// Creates a capture for the requested sample rate and device.
    ///
    /// The actual rate may differ based on device capabilities; the artifact
    /// carries the rate that was really used.
    pub fn new(requested_sample_rate: u32, device_name: String, reference_level_db: i8) -> Self {
        Self {
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            stream: None,
            device_name,
            reference_level_db,
        }
    }

    /// Folds incoming multi-channel data to mono and appends it.
    fn handle_audio_callback(data: &[i16], samples_arc: &Arc<Mutex<Vec<i16>>>, num_channels: usize) {
        let mut samples = samples_arc.lock().unwrap();

        match num_channels {
            1 => samples.extend_from_slice(data),
            2 => {
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    samples.push(((left + right) / 2) as i16);
                }
            }
            _ => {
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    samples.push((sum / num_channels as i32) as i16);
                }
            }
        }
    }
}

impl AudioCapture for MicCapture {
    /// Starts capturing from the configured input device.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if the device is missing, permission is denied,
    ///   or the stream cannot be built or started
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(TabibError::InvalidInput(
                "capture already started".to_string(),
            ));
        }

        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device().ok_or_else(|| {
                    TabibError::DeviceUnavailable("no audio input device available".to_string())
                })
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device
            .default_input_config()
            .map_err(|e| TabibError::DeviceUnavailable(format!("device configuration failed: {e}")))?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        if device_sample_rate != self.sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                self.sample_rate,
                device_sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            num_channels
        );

        self.sample_rate = device_sample_rate;
        self.samples.lock().unwrap().clear();

        let samples_arc = Arc::clone(&self.samples);
        let callback_channels = num_channels;

        let stream = device
            .build_input_stream(
                &device_config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    Self::handle_audio_callback(data, &samples_arc, callback_channels);
                },
                |err| {
                    tracing::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| TabibError::DeviceUnavailable(format!("failed to open audio stream: {e}")))?;

        stream
            .play()
            .map_err(|e| TabibError::DeviceUnavailable(format!("failed to start audio stream: {e}")))?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    /// Stops capturing, releases the device, and finalizes the artifact.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if WAV finalization fails (the device is
    ///   released regardless)
    fn stop(&mut self) -> Result<Option<AudioArtifact>> {
        if self.stream.take().is_none() {
            return Ok(None);
        }

        let samples = std::mem::take(&mut *self.samples.lock().unwrap());
        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        let artifact = AudioArtifact::from_samples(&samples, self.sample_rate)?;
        Ok(Some(artifact))
    }

    fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Current input level as a percentage of the reference level.
    ///
    /// RMS over the most recent ~50ms of samples, converted to dBFS and
    /// normalized against `reference_level_db`.
    fn level(&self) -> u8 {
        let samples = self.samples.lock().unwrap();
        if samples.is_empty() {
            return 0;
        }

        let window = std::cmp::min((self.sample_rate / 20) as usize, samples.len());
        let recent = &samples[samples.len() - window..];

        let sum_of_squares: i64 = recent.iter().map(|&x| (x as i64).pow(2)).sum();
        let mean_square = sum_of_squares / recent.len() as i64;
        let rms = (mean_square as f32).sqrt();

        let db_fs = if rms > 0.0 {
            20.0 * (rms / 32767.0).log10()
        } else {
            -160.0
        };

        let min_db = self.reference_level_db as f32 - 40.0;
        ((db_fs - min_db) / 40.0 * 100.0).clamp(0.0, 100.0) as u8
    }
}

/// Finds an audio input device by name or numeric index.
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let devices: Vec<_> = host
        .input_devices()
        .map_err(|e| TabibError::DeviceUnavailable(format!("failed to enumerate devices: {e}")))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        }
        return Err(TabibError::DeviceUnavailable(format!(
            "device index {} is out of range (0-{})",
            index,
            devices.len().saturating_sub(1)
        )));
    }

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(TabibError::DeviceUnavailable(format!(
        "audio input device '{device_spec}' not found. Use 'tabib list-devices' to see available devices."
    )))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library
/// warnings on Linux. On other platforms this is a no-op.
#[cfg(target_os = "linux")]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(TabibError::Io)?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(TabibError::DeviceUnavailable(
            "failed to duplicate stderr".to_string(),
        ));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(TabibError::DeviceUnavailable(
            "failed to redirect stderr".to_string(),
        ));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
