// Trailing linear fade envelope.
//
// The only envelope shape the engine needs: full gain for a sustain region,
// then a straight ramp from 1.0 down to exactly 0.0 on the final sample.
// The ramp includes both endpoints, so a fade of `n` samples steps by
// `1 / (n - 1)`. A one-sample fade is just the closing 0.0.

/// Gain profile for a segment of `len` samples whose last `fade_len`
/// samples ramp down to silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeEnvelope {
    len: usize,
    fade_len: usize,
}

impl FadeEnvelope {
    /// A fade longer than the segment is clamped: the whole segment fades.
    pub fn new(len: usize, fade_len: usize) -> Self {
        FadeEnvelope {
            len,
            fade_len: fade_len.min(len),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn fade_len(&self) -> usize {
        self.fade_len
    }

    /// Samples before the fade window. Never negative.
    pub fn sustain_len(&self) -> usize {
        self.len - self.fade_len
    }

    /// Gain at sample `i`.
    pub fn gain(&self, i: usize) -> f64 {
        let sustain = self.sustain_len();
        if i < sustain {
            return 1.0;
        }
        let k = i - sustain;
        if self.fade_len <= 1 {
            0.0
        } else {
            1.0 - k as f64 / (self.fade_len - 1) as f64
        }
    }

    /// Scale the fade window in place. Sustain samples are left untouched.
    pub fn apply(&self, samples: &mut [f64]) {
        debug_assert_eq!(samples.len(), self.len);
        let sustain = self.sustain_len();
        for (i, sample) in samples.iter_mut().enumerate().skip(sustain) {
            *sample *= self.gain(i);
        }
    }

    /// The envelope as a per-sample multiplier vector.
    pub fn curve(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.gain(i)).collect()
    }
}
