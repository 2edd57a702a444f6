//! Time-keyed tracks of interpolatable values.

use glam::{Quat, Vec3};

/// Values a [`KeyframeTrack`] can interpolate between two keys.
pub trait Interpolatable: Copy {
    fn interpolate(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for Vec3 {
    fn interpolate(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }
}

impl Interpolatable for Quat {
    /// Spherical interpolation, re-normalized to guard against drift from
    /// repeated slerps and imprecise source data.
    fn interpolate(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t).normalize()
    }
}

/// One authored sample: a value and the animation-native tick at which the
/// driven channel should hold it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub value: T,
    pub timestamp: f32,
}

impl<T> Keyframe<T> {
    pub fn new(value: T, timestamp: f32) -> Self {
        Self { value, timestamp }
    }
}

/// A keyframe track over one channel, ordered ascending by timestamp.
#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    keys: Vec<Keyframe<T>>,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Keys must be pre-sorted ascending by timestamp.
    #[must_use]
    pub fn new(keys: Vec<Keyframe<T>>) -> Self {
        Self { keys }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Keyframe<T>> {
        self.keys.first()
    }

    /// Deterministic value of the track at `time` (in ticks).
    ///
    /// A single-key track returns that key's value unchanged. Otherwise the
    /// bracketing pair `[i, i + 1]` with `timestamp[i] <= time <
    /// timestamp[i + 1]` is located, clamped to the final pair past the end
    /// of the track; the interpolation parameter is clamped to `[0, 1]`, so
    /// sampling before the first or after the last key holds the boundary
    /// value rather than extrapolating.
    ///
    /// # Panics
    /// On an empty track. Construction paths validate non-emptiness, so an
    /// empty track here is a wiring bug.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        assert!(!self.keys.is_empty(), "cannot sample an empty keyframe track");

        let len = self.keys.len();
        if len == 1 {
            return self.keys[0].value;
        }

        // partition_point yields the first key strictly after `time`.
        let next = self.keys.partition_point(|k| k.timestamp <= time);
        let index = next.saturating_sub(1).min(len - 2);

        let current = &self.keys[index];
        let next = &self.keys[index + 1];

        let span = next.timestamp - current.timestamp;
        let u = if span > 1e-6 {
            ((time - current.timestamp) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        T::interpolate(current.value, next.value, u)
    }
}
