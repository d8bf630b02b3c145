#![forbid(unsafe_code)]

//! Property tweens: time-bounded interpolation of one visual property.
//!
//! A [`Tween`] owns its elapsed time and is advanced by delta-time ticks.
//! `tick` returns the unconsumed overshoot so a scheduler can forward the
//! remainder into whatever runs next, keeping sequential chains exact.
//!
//! # Invariants
//!
//! 1. Durations are clamped to a 1ns minimum, so progress is always a
//!    well-defined ratio.
//! 2. `sample()` at completion equals the declared end value exactly,
//!    independent of tick granularity.
//! 3. `tick` past completion is a no-op returning the full delta.

use std::time::Duration;

use crate::easing::Easing;

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// One interpolated property value, tagged by the property it drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimSample {
    /// Opacity in `[0, 1]`.
    Opacity(f32),
    /// Uniform scale factor, 1.0 = natural size.
    Scale(f32),
    /// Translation offset from the panel's resting position.
    Offset { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TweenKind {
    Fade { from: f32, to: f32 },
    Scale { from: f32, to: f32 },
    Slide { from: (f32, f32), to: (f32, f32) },
}

impl TweenKind {
    fn sample(self, t: f32) -> AnimSample {
        let lerp = |a: f32, b: f32| a + (b - a) * t;
        match self {
            Self::Fade { from, to } => AnimSample::Opacity(lerp(from, to)),
            Self::Scale { from, to } => AnimSample::Scale(lerp(from, to)),
            Self::Slide { from, to } => AnimSample::Offset {
                x: lerp(from.0, to.0),
                y: lerp(from.1, to.1),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// A single-property tween with its own elapsed-time state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    kind: TweenKind,
    duration: Duration,
    easing: Easing,
    elapsed: Duration,
}

impl Tween {
    fn new(kind: TweenKind, duration: Duration) -> Self {
        Self {
            kind,
            duration: duration.max(Duration::from_nanos(1)),
            easing: Easing::default(),
            elapsed: Duration::ZERO,
        }
    }

    /// Opacity tween from `from` to `to`.
    #[must_use]
    pub fn fade(from: f32, to: f32, duration: Duration) -> Self {
        Self::new(TweenKind::Fade { from, to }, duration)
    }

    /// Uniform-scale tween from `from` to `to`.
    #[must_use]
    pub fn scale(from: f32, to: f32, duration: Duration) -> Self {
        Self::new(TweenKind::Scale { from, to }, duration)
    }

    /// Offset tween between two `(x, y)` positions.
    #[must_use]
    pub fn slide(from: (f32, f32), to: (f32, f32), duration: Duration) -> Self {
        Self::new(TweenKind::Slide { from, to }, duration)
    }

    /// Set the easing curve.
    #[must_use]
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Total duration (post-clamp).
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether the tween has consumed its full duration.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Raw progress in `[0, 1]`, before easing.
    #[must_use]
    pub fn progress(&self) -> f32 {
        (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Advance by `dt`, returning the portion of `dt` past completion.
    pub fn tick(&mut self, dt: Duration) -> Duration {
        if self.is_complete() {
            return dt;
        }
        let remaining = self.duration - self.elapsed;
        if dt >= remaining {
            self.elapsed = self.duration;
            dt - remaining
        } else {
            self.elapsed += dt;
            Duration::ZERO
        }
    }

    /// Current eased sample.
    #[must_use]
    pub fn sample(&self) -> AnimSample {
        self.sample_at(self.progress())
    }

    /// Eased sample at an arbitrary progress, ignoring elapsed state.
    #[must_use]
    pub fn sample_at(&self, t: f32) -> AnimSample {
        self.kind.sample(self.easing.apply(t))
    }

    /// The sample at progress 0.
    #[must_use]
    pub fn start_sample(&self) -> AnimSample {
        self.kind.sample(0.0)
    }

    /// The sample at progress 1.
    #[must_use]
    pub fn end_sample(&self) -> AnimSample {
        self.kind.sample(1.0)
    }

    /// Rewind to the beginning, keeping the curve and endpoints.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

// ---------------------------------------------------------------------------
// Declarative recipes
// ---------------------------------------------------------------------------

/// A declarative animation recipe, instantiated into live tweens by the
/// driver each time it is played.
///
/// Recipes are plain data: cheap to clone, inert until instantiated, and
/// reusable across panels.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimDecl {
    /// Opacity tween.
    Fade {
        from: f32,
        to: f32,
        duration: Duration,
        easing: Easing,
    },
    /// Uniform-scale tween.
    Scale {
        from: f32,
        to: f32,
        duration: Duration,
        easing: Easing,
    },
    /// Offset tween.
    Slide {
        from: (f32, f32),
        to: (f32, f32),
        duration: Duration,
        easing: Easing,
    },
    /// All children run simultaneously; done when the longest is.
    Parallel(Vec<AnimDecl>),
    /// Children run back to back in order.
    Sequential(Vec<AnimDecl>),
}

impl AnimDecl {
    /// Fade recipe with linear easing.
    #[must_use]
    pub fn fade(from: f32, to: f32, duration: Duration) -> Self {
        Self::Fade {
            from,
            to,
            duration,
            easing: Easing::default(),
        }
    }

    /// Scale recipe with linear easing.
    #[must_use]
    pub fn scale(from: f32, to: f32, duration: Duration) -> Self {
        Self::Scale {
            from,
            to,
            duration,
            easing: Easing::default(),
        }
    }

    /// Slide recipe with linear easing.
    #[must_use]
    pub fn slide(from: (f32, f32), to: (f32, f32), duration: Duration) -> Self {
        Self::Slide {
            from,
            to,
            duration,
            easing: Easing::default(),
        }
    }

    /// Replace the easing on a leaf recipe; composites are unchanged.
    #[must_use]
    pub fn with_easing(mut self, e: Easing) -> Self {
        match &mut self {
            Self::Fade { easing, .. } | Self::Scale { easing, .. } | Self::Slide { easing, .. } => {
                *easing = e;
            }
            Self::Parallel(_) | Self::Sequential(_) => {}
        }
        self
    }

    /// Total duration: leaves report their own (1ns-clamped), `Parallel`
    /// the maximum child, `Sequential` the sum.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self {
            Self::Fade { duration, .. }
            | Self::Scale { duration, .. }
            | Self::Slide { duration, .. } => (*duration).max(Duration::from_nanos(1)),
            Self::Parallel(children) => children
                .iter()
                .map(AnimDecl::duration)
                .max()
                .unwrap_or(Duration::ZERO),
            Self::Sequential(children) => children.iter().map(AnimDecl::duration).sum(),
        }
    }

    /// Build the live tween for a leaf recipe. `None` for composites.
    #[must_use]
    pub fn leaf_tween(&self) -> Option<Tween> {
        match *self {
            Self::Fade {
                from,
                to,
                duration,
                easing,
            } => Some(Tween::fade(from, to, duration).easing(easing)),
            Self::Scale {
                from,
                to,
                duration,
                easing,
            } => Some(Tween::scale(from, to, duration).easing(easing)),
            Self::Slide {
                from,
                to,
                duration,
                easing,
            } => Some(Tween::slide(from, to, duration).easing(easing)),
            Self::Parallel(_) | Self::Sequential(_) => None,
        }
    }
}
