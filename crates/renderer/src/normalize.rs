/// Per-channel affine correction `value * mult + add` that maps a formula's
/// observed output range onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationParams {
    pub mult: [f32; 3],
    pub add: [f32; 3],
}

impl NormalizationParams {
    /// Leaves values untouched; used for the sample pass.
    pub const NEUTRAL: Self = Self {
        mult: [1.0; 3],
        add: [0.0; 3],
    };

    /// Derives the correction from sample-pass pixels (RGBA, alpha ignored).
    ///
    /// Non-finite samples are skipped. A channel without a single finite
    /// sample is treated as a constant zero.
    pub fn from_samples(samples: &[[f32; 4]]) -> Self {
        let mut params = Self::NEUTRAL;
        for channel in 0..3 {
            let (min, max) = samples
                .iter()
                .map(|pixel| pixel[channel])
                .filter(|value| value.is_finite())
                .fold(None, |range, value| match range {
                    None => Some((value, value)),
                    Some((min, max)) => Some((f32::min(min, value), f32::max(max, value))),
                })
                .unwrap_or((0.0, 0.0));
            let (mult, add) = channel_correction(min, max);
            params.mult[channel] = mult;
            params.add[channel] = add;
        }
        params
    }

    pub fn apply(&self, value: [f32; 3]) -> [f32; 3] {
        std::array::from_fn(|channel| value[channel] * self.mult[channel] + self.add[channel])
    }

    pub(crate) fn mult_vec4(&self) -> [f32; 4] {
        [self.mult[0], self.mult[1], self.mult[2], 1.0]
    }

    pub(crate) fn add_vec4(&self) -> [f32; 4] {
        [self.add[0], self.add[1], self.add[2], 0.0]
    }
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// `(mult, add)` for one channel. A flat channel is shifted to zero instead
/// of divided by zero.
pub fn channel_correction(min: f32, max: f32) -> (f32, f32) {
    if min == max {
        (1.0, -min)
    } else {
        let mult = 1.0 / (max - min);
        (mult, -min * mult)
    }
}
