#![forbid(unsafe_code)]

//! Easing curves for tween interpolation.
//!
//! Every curve maps normalized progress `t` in `[0, 1]` to an eased value
//! in `[0, 1]`; inputs outside the range are clamped first, so curves are
//! safe to call with the raw elapsed/duration ratio.

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// An easing curve applied to normalized tween progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    /// Linear interpolation: `t` (no easing).
    #[default]
    Linear,
    /// Slow start, accelerating: `t³`
    EaseIn,
    /// Slow end, decelerating: `1 - (1-t)³`
    EaseOut,
    /// Smooth S-curve: slow start and end.
    EaseInOut,
}

impl Easing {
    /// Apply the curve to a progress value, clamping `t` to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t * t,
            Self::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}
