//! Revocable playback reference to the recorded artifact.
//!
//! Playback goes through the system audio player, so the handle materializes
//! the artifact as a uniquely named WAV file in the OS temp directory. The
//! file is removed by `revoke`, exactly once; a handle reaching `Drop`
//! unrevoked is treated as a leak of the teardown contract and cleaned up
//! with a warning.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, TabibError};
use crate::recording::AudioArtifact;

static HANDLE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct PlaybackHandle {
    path: PathBuf,
    revoked: bool,
}

impl PlaybackHandle {
    /// Writes the artifact to a fresh temp file and wraps it in a handle.
    ///
    /// # Errors
    /// - If the temp file cannot be written
    pub fn new(artifact: &AudioArtifact) -> Result<Self> {
        let seq = HANDLE_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "tabib-playback-{}-{}.wav",
            std::process::id(),
            seq
        ));
        std::fs::write(&path, artifact.bytes())?;
        tracing::debug!("Playback handle created: {}", path.display());
        Ok(Self {
            path,
            revoked: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    /// Releases the handle, removing the backing file. Exactly one release
    /// takes effect; later calls are no-ops.
    pub fn revoke(&mut self) {
        if self.revoked {
            return;
        }
        self.revoked = true;
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Failed to remove playback file {}: {}", self.path.display(), e);
        }
        tracing::debug!("Playback handle revoked: {}", self.path.display());
    }

    /// Spawns the system audio player on the backing file, non-blocking.
    ///
    /// macOS uses `open`; Linux tries `xdg-open` then common players.
    ///
    /// # Errors
    /// - `InvalidInput` if the handle was already revoked
    /// - If no player can be spawned
    pub fn play(&self) -> Result<()> {
        if self.revoked {
            return Err(TabibError::InvalidInput(
                "playback handle already revoked".to_string(),
            ));
        }

        #[cfg(target_os = "macos")]
        {
            Command::new("open").arg(&self.path).spawn()?;
            return Ok(());
        }

        #[cfg(not(target_os = "macos"))]
        {
            if Command::new("xdg-open").arg(&self.path).spawn().is_ok() {
                return Ok(());
            }

            for player in ["mpv", "vlc", "ffplay", "paplay"] {
                if Command::new(player).arg(&self.path).spawn().is_ok() {
                    return Ok(());
                }
            }

            Err(TabibError::InvalidInput(
                "no audio player found. Install mpv, vlc, ffplay, or paplay".to_string(),
            ))
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if !self.revoked {
            tracing::warn!(
                "Playback handle dropped without revoke: {}",
                self.path.display()
            );
            self.revoke();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_artifact() -> AudioArtifact {
        AudioArtifact::from_samples(&[0i16; 160], 16000).unwrap()
    }

    #[test]
    fn revoke_removes_the_backing_file_once() {
        let mut handle = PlaybackHandle::new(&small_artifact()).unwrap();
        let path = handle.path().to_path_buf();
        assert!(path.exists());
        handle.revoke();
        assert!(!path.exists());
        assert!(handle.is_revoked());
        // second revoke is a no-op
        handle.revoke();
        assert!(handle.is_revoked());
    }

    #[test]
    fn play_after_revoke_is_rejected() {
        let mut handle = PlaybackHandle::new(&small_artifact()).unwrap();
        handle.revoke();
        assert!(matches!(handle.play(), Err(TabibError::InvalidInput(_))));
    }

    #[test]
    fn drop_cleans_up_an_unrevoked_handle() {
        let path = {
            let handle = PlaybackHandle::new(&small_artifact()).unwrap();
            handle.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
