//! Cosmetic waveform frame shown while recording.
//!
//! A fixed frame of 50 amplitude slots in [0, 100], rewritten wholesale on
//! every sampling tick and zeroed when sampling ends. The values are
//! synthetic jitter around the current capture level; liveness is the only
//! requirement.

/// Number of amplitude slots in the frame.
pub const WAVEFORM_LEN: usize = 50;

#[derive(Debug)]
pub struct WaveformSampler {
    frame: [u8; WAVEFORM_LEN],
    active: bool,
    seed: u64,
}

impl Default for WaveformSampler {
    fn default() -> Self {
        Self {
            frame: [0; WAVEFORM_LEN],
            active: false,
            seed: 0x9e37_79b9_7f4a_7c15,
        }
    }
}

impl WaveformSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts sampling. Every `begin` is paired with exactly one `end` by the
    /// session transitions.
    pub fn begin(&mut self) {
        self.active = true;
    }

    /// Rewrites the whole frame from the current input level. Ignored while
    /// inactive.
    pub fn tick(&mut self, level: u8) {
        if !self.active {
            return;
        }
        let level = level.min(100) as u64;
        for slot in self.frame.iter_mut() {
            // xorshift64* jitter; cosmetic only
            self.seed ^= self.seed << 13;
            self.seed ^= self.seed >> 7;
            self.seed ^= self.seed << 17;
            let jitter = self.seed % 101;
            *slot = ((level + jitter) / 2).min(100) as u8;
        }
    }

    /// Stops sampling and zeroes the frame. Idempotent.
    pub fn end(&mut self) {
        self.active = false;
        self.frame = [0; WAVEFORM_LEN];
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frame(&self) -> &[u8; WAVEFORM_LEN] {
        &self.frame
    }

    pub fn is_zeroed(&self) -> bool {
        self.frame.iter().all(|&v| v == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_before_begin_is_ignored() {
        let mut sampler = WaveformSampler::new();
        sampler.tick(80);
        assert!(sampler.is_zeroed());
    }

    #[test]
    fn tick_rewrites_the_frame_within_bounds() {
        let mut sampler = WaveformSampler::new();
        sampler.begin();
        sampler.tick(100);
        assert!(!sampler.is_zeroed());
        assert!(sampler.frame().iter().all(|&v| v <= 100));
    }

    #[test]
    fn end_zeroes_and_is_idempotent() {
        let mut sampler = WaveformSampler::new();
        sampler.begin();
        sampler.tick(60);
        sampler.end();
        assert!(sampler.is_zeroed());
        assert!(!sampler.is_active());
        sampler.end();
        assert!(sampler.is_zeroed());
    }
}
