//! Time-parameterised interpolation with easing curves.

use bevy::math::DVec3;

/// Easing curves, matching the usual tweening library definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    QuadraticOut,
    QuarticOut,
    QuarticInOut,
}

impl Easing {
    /// Map linear progress `t` in `[0, 1]` onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticOut => t * (2.0 - t),
            Easing::QuarticOut => 1.0 - (1.0 - t).powi(4),
            Easing::QuarticInOut => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - 8.0 * (t - 1.0).powi(4)
                }
            }
        }
    }
}

/// Values a tween can interpolate.
pub trait Lerp: Copy {
    fn lerp_to(self, other: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp_to(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for DVec3 {
    fn lerp_to(self, other: Self, t: f64) -> Self {
        self.lerp(other, t)
    }
}

/// A single animation from `from` to `to`, started at `start_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween<T> {
    from: T,
    to: T,
    start_ms: f64,
    duration_ms: f64,
    easing: Easing,
}

impl<T: Lerp> Tween<T> {
    pub fn new(from: T, to: T, start_ms: f64, duration_ms: f64, easing: Easing) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms,
            easing,
        }
    }

    pub fn from(&self) -> T {
        self.from
    }

    pub fn to(&self) -> T {
        self.to
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Linear progress at `now_ms`, clamped to `[0, 1]`.
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn value_at(&self, now_ms: f64) -> T {
        let progress = self.progress(now_ms);
        if progress >= 1.0 {
            return self.to;
        }
        self.from.lerp_to(self.to, self.easing.apply(progress))
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }
}

impl Tween<DVec3> {
    /// Move both endpoints, keeping the animation's shape.
    pub fn translate(&mut self, delta: DVec3) {
        self.from += delta;
        self.to += delta;
    }
}
