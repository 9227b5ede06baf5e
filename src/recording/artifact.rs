//! The finalized audio recording: an immutable in-memory WAV blob.

use std::io::Cursor;
use std::path::Path;

use crate::error::{Result, TabibError};

/// Immutable binary audio artifact produced by stopping capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    bytes: Vec<u8>,
    sample_rate: u32,
    sample_count: usize,
}

impl AudioArtifact {
    /// Encodes mono i16 PCM samples into a WAV blob.
    ///
    /// # Errors
    /// - `DeviceUnavailable` if WAV finalization fails
    pub fn from_samples(samples: &[i16], sample_rate: u32) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| TabibError::DeviceUnavailable(format!("failed to finalize recording: {e}")))?;
            for &sample in samples {
                writer.write_sample(sample).map_err(|e| {
                    TabibError::DeviceUnavailable(format!("failed to finalize recording: {e}"))
                })?;
            }
            writer.finalize().map_err(|e| {
                TabibError::DeviceUnavailable(format!("failed to finalize recording: {e}"))
            })?;
        }

        Ok(Self {
            bytes: cursor.into_inner(),
            sample_rate,
            sample_count: samples.len(),
        })
    }

    /// Loads an existing audio file as an artifact for the `transcribe`
    /// command. The bytes are passed through untouched.
    ///
    /// # Errors
    /// - `InvalidInput` if the file is missing or empty
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| TabibError::InvalidInput(format!("cannot read {}: {e}", path.display())))?;
        if bytes.is_empty() {
            return Err(TabibError::InvalidInput(format!(
                "audio file is empty: {}",
                path.display()
            )));
        }
        Ok(Self {
            bytes,
            sample_rate: 0,
            sample_count: 0,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Recording duration in seconds; 0.0 for artifacts loaded from disk.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count as f32 / self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_samples_into_a_wav_blob() {
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16).collect();
        let artifact = AudioArtifact::from_samples(&samples, 16000).unwrap();
        assert!(!artifact.is_empty());
        // RIFF header
        assert_eq!(&artifact.bytes()[..4], b"RIFF");
        assert!((artifact.duration_secs() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn empty_recording_still_yields_a_valid_header() {
        let artifact = AudioArtifact::from_samples(&[], 16000).unwrap();
        assert!(!artifact.is_empty());
        assert_eq!(artifact.duration_secs(), 0.0);
    }
}
